use bytes::{Buf, BufMut, Bytes};

use super::{ensure_remaining, Decode, Encode};
use crate::error::CodecError;

impl Encode for Bytes {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32(self.len() as u32);
        buf.put_slice(self);
    }

    fn size(&self) -> usize {
        4 + self.len()
    }
}

impl Decode for Bytes {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let len = u32::decode(buf)? as usize;
        ensure_remaining(buf, len)?;
        Ok(buf.copy_to_bytes(len))
    }
}
