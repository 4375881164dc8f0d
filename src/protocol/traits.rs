//! Read/write traits for the fixed-width wire format used by assignor user data.

use std::io::{Read, Write};

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReadError {
    #[error("Cannot read data: {0}")]
    IO(#[from] std::io::Error),

    #[error("Overflow converting integer: {0}")]
    Overflow(#[from] std::num::TryFromIntError),

    #[error("Malformed data: {0}")]
    Malformed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ReadError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into().into())
    }
}

/// A type that can be decoded from a byte stream.
pub trait ReadType<R>: Sized
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError>;
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WriteError {
    #[error("Cannot write data: {0}")]
    IO(#[from] std::io::Error),

    #[error("Overflow converting integer: {0}")]
    Overflow(#[from] std::num::TryFromIntError),

    #[error("Malformed data: {0}")]
    Malformed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A type that can be encoded into a byte stream.
pub trait WriteType<W>: Sized
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError>;
}

/// Reads the `INT32` length prefix of a non-nullable `ARRAY`.
///
/// Unlike the nullable arrays of the request/response messages, `-1` is not a
/// valid value here, so every negative length is rejected.
pub fn read_array_len<R: Read>(reader: &mut R) -> Result<usize, ReadError> {
    let len = i32::read(reader)?;
    if len < 0 {
        return Err(ReadError::malformed(format!(
            "Invalid negative length for array: {len}"
        )));
    }

    Ok(usize::try_from(len)?)
}

/// Writes the `INT32` length prefix of a non-nullable `ARRAY`.
pub fn write_array_len<W: Write>(writer: &mut W, len: usize) -> Result<(), WriteError> {
    let len = i32::try_from(len)?;
    len.write(writer)
}
