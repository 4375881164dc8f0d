#![no_main]
use std::io::Cursor;

use lag_assignor::protocol::traits::ReadType;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut cursor = Cursor::new(data);
    let _ = String::read(&mut cursor);
    let _ = Vec::<i32>::read(&mut cursor);
});
