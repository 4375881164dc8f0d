//! Wire format of the assignor's subscription user data.

pub mod member_data;
pub mod primitives;
pub mod traits;

#[cfg(test)]
mod test_utils;
