#![no_main]
use lag_assignor::protocol::member_data::MemberData;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let decoded = MemberData::decode(data);
    let _ = decoded.encode();
});
