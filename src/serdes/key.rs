use bytes::{Buf, BufMut, Bytes};

use super::{Decode, Encode};
use crate::{
    error::CodecError,
    key::{ClusteringPrefix, ClusteringValue},
};

const VALUE_INT: u8 = 0;
const VALUE_TEXT: u8 = 1;
const VALUE_BLOB: u8 = 2;

impl Encode for ClusteringValue {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        match self {
            ClusteringValue::Int(v) => {
                buf.put_u8(VALUE_INT);
                buf.put_i64(*v);
            }
            ClusteringValue::Text(v) => {
                buf.put_u8(VALUE_TEXT);
                v.encode(buf);
            }
            ClusteringValue::Blob(v) => {
                buf.put_u8(VALUE_BLOB);
                v.encode(buf);
            }
        }
    }

    fn size(&self) -> usize {
        1 + match self {
            ClusteringValue::Int(_) => 8,
            ClusteringValue::Text(v) => v.size(),
            ClusteringValue::Blob(v) => v.size(),
        }
    }
}

impl Decode for ClusteringValue {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        match u8::decode(buf)? {
            VALUE_INT => i64::decode(buf).map(ClusteringValue::Int),
            VALUE_TEXT => String::decode(buf).map(ClusteringValue::Text),
            VALUE_BLOB => Bytes::decode(buf).map(ClusteringValue::Blob),
            tag => Err(CodecError::UnknownTag {
                what: "clustering value",
                tag,
            }),
        }
    }
}

impl Encode for ClusteringPrefix {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(self.len() as u16);
        for value in self.components() {
            value.encode(buf);
        }
    }

    fn size(&self) -> usize {
        2 + self.components().iter().map(Encode::size).sum::<usize>()
    }
}

impl Decode for ClusteringPrefix {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let len = u16::decode(buf)? as usize;
        let mut components = Vec::with_capacity(len.min(buf.remaining()));
        for _ in 0..len {
            components.push(ClusteringValue::decode(buf)?);
        }
        Ok(ClusteringPrefix::new(components))
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn text_must_be_utf8() {
        let mut buf = BytesMut::new();
        buf.put_u8(VALUE_TEXT);
        buf.put_u32(2);
        buf.put_slice(&[0xff, 0xfe]);
        let mut input = &buf[..];
        assert_eq!(ClusteringValue::decode(&mut input), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn prefix_decodes_back() {
        let prefix = ClusteringPrefix::new(vec![
            ClusteringValue::Int(-4),
            "k".into(),
            Bytes::from_static(b"\x00\x01").into(),
        ]);
        let mut buf = BytesMut::new();
        prefix.encode(&mut buf);
        assert_eq!(buf.len(), prefix.size());
        let mut input = &buf[..];
        assert_eq!(ClusteringPrefix::decode(&mut input), Ok(prefix));
    }
}
