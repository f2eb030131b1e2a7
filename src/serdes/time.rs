use bytes::{Buf, BufMut};

use super::{Decode, Encode};
use crate::{
    error::CodecError,
    mvcc::{GcTime, Timestamp, Ttl},
    tombstone::Tombstone,
};

impl Encode for Timestamp {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_i64(self.get());
    }

    fn size(&self) -> usize {
        8
    }
}

impl Decode for Timestamp {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        i64::decode(buf).map(Timestamp::new)
    }
}

impl Encode for GcTime {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32(self.as_secs());
    }

    fn size(&self) -> usize {
        4
    }
}

impl Decode for GcTime {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        u32::decode(buf).map(GcTime::from_secs)
    }
}

impl Encode for Ttl {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32(self.as_secs());
    }

    fn size(&self) -> usize {
        4
    }
}

impl Decode for Ttl {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        u32::decode(buf).map(Ttl::from_secs)
    }
}

impl Encode for Tombstone {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        self.timestamp.encode(buf);
        self.deletion_time.encode(buf);
    }

    fn size(&self) -> usize {
        self.timestamp.size() + self.deletion_time.size()
    }
}

impl Decode for Tombstone {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let timestamp = Timestamp::decode(buf)?;
        let deletion_time = GcTime::decode(buf)?;
        Ok(Tombstone::new(timestamp, deletion_time))
    }
}
