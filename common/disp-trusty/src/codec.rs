// Licensed under the Apache-2.0 license

use zerocopy::{FromBytes, Immutable, IntoBytes};

#[derive(Debug, PartialEq)]
pub enum TrustyCodecError {
    BufferTooShort,
}

/// Encoding and decoding of the fixed-layout messages exchanged with the
/// display trusted application.
pub trait TrustyCodec: core::fmt::Debug + Sized {
    /// Encodes the message into the provided byte buffer.
    ///
    /// # Returns
    ///
    /// The number of bytes written, or `TrustyCodecError::BufferTooShort`.
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, TrustyCodecError>;

    /// Decodes a message from the start of `buffer`.
    fn decode(buffer: &[u8]) -> Result<Self, TrustyCodecError>;
}

impl<T> TrustyCodec for T
where
    T: core::fmt::Debug + Sized + FromBytes + IntoBytes + Immutable,
{
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, TrustyCodecError> {
        self.write_to_prefix(buffer)
            .map_err(|_| TrustyCodecError::BufferTooShort)
            .map(|_| core::mem::size_of::<T>())
    }

    fn decode(buffer: &[u8]) -> Result<Self, TrustyCodecError> {
        Ok(Self::read_from_prefix(buffer)
            .map_err(|_| TrustyCodecError::BufferTooShort)?
            .0)
    }
}
