//! Synchronous byte codec for partition views and collection cells.
//!
//! Values are written big-endian through [`bytes::BufMut`] and read back
//! through [`bytes::Buf`]. Decoding checks remaining length before every
//! read, so malformed input yields a [`CodecError`] rather than a panic.

mod bytes;
mod cell;
mod key;
mod num;
mod string;
mod time;

use ::bytes::{Buf, BufMut};

use crate::error::CodecError;

pub(crate) trait Encode {
    fn encode<B: BufMut>(&self, buf: &mut B);

    fn size(&self) -> usize;
}

impl<T: Encode> Encode for &T {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        Encode::encode(*self, buf)
    }

    fn size(&self) -> usize {
        Encode::size(*self)
    }
}

pub(crate) trait Decode: Sized {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError>;
}

impl<A: Encode, C: Encode> Encode for (A, C) {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        self.0.encode(buf);
        self.1.encode(buf);
    }

    fn size(&self) -> usize {
        self.0.size() + self.1.size()
    }
}

impl<A: Decode, C: Decode> Decode for (A, C) {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let a = A::decode(buf)?;
        let c = C::decode(buf)?;
        Ok((a, c))
    }
}

/// Fail with [`CodecError::Truncated`] unless `needed` bytes remain.
pub(crate) fn ensure_remaining<B: Buf>(buf: &B, needed: usize) -> Result<(), CodecError> {
    if buf.remaining() < needed {
        return Err(CodecError::Truncated {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Encode a length-prefixed sequence.
pub(crate) fn encode_seq<'a, T, B, I>(items: I, buf: &mut B)
where
    T: Encode + 'a,
    B: BufMut,
    I: ExactSizeIterator<Item = &'a T>,
{
    buf.put_u32(items.len() as u32);
    for item in items {
        item.encode(buf);
    }
}

/// Decode a length-prefixed sequence written by [`encode_seq`].
pub(crate) fn decode_seq<T: Decode, B: Buf>(buf: &mut B) -> Result<Vec<T>, CodecError> {
    let len = u32::decode(buf)? as usize;
    // Cap the reservation by what the input could possibly hold.
    let mut out = Vec::with_capacity(len.min(buf.remaining()));
    for _ in 0..len {
        out.push(T::decode(buf)?);
    }
    Ok(out)
}
