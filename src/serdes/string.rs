use bytes::{Buf, BufMut, Bytes};

use super::{Decode, Encode};
use crate::error::CodecError;

impl Encode for String {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32(self.len() as u32);
        buf.put_slice(self.as_bytes());
    }

    fn size(&self) -> usize {
        4 + self.len()
    }
}

impl Decode for String {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let raw = Bytes::decode(buf)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}
