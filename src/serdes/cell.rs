use bytes::{Buf, BufMut, Bytes};

use super::{decode_seq, encode_seq, Decode, Encode};
use crate::{
    cell::{AtomicCell, CellOrCollection, CollectionMutation, Expiry},
    error::CodecError,
    marker::RowMarker,
    mvcc::{GcTime, Timestamp, Ttl},
    tombstone::Tombstone,
};

const CELL_LIVE: u8 = 0;
const CELL_EXPIRING: u8 = 1;
const CELL_DEAD: u8 = 2;

impl Encode for AtomicCell {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        match self {
            AtomicCell::Live {
                timestamp,
                value,
                expiry,
            } => {
                match expiry {
                    None => buf.put_u8(CELL_LIVE),
                    Some(_) => buf.put_u8(CELL_EXPIRING),
                }
                timestamp.encode(buf);
                value.encode(buf);
                if let Some(e) = expiry {
                    e.expiry.encode(buf);
                    e.ttl.encode(buf);
                }
            }
            AtomicCell::Dead {
                timestamp,
                deletion_time,
            } => {
                buf.put_u8(CELL_DEAD);
                timestamp.encode(buf);
                deletion_time.encode(buf);
            }
        }
    }

    fn size(&self) -> usize {
        1 + match self {
            AtomicCell::Live { value, expiry, .. } => {
                8 + value.size() + if expiry.is_some() { 8 } else { 0 }
            }
            AtomicCell::Dead { .. } => 8 + 4,
        }
    }
}

impl Decode for AtomicCell {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let tag = u8::decode(buf)?;
        match tag {
            CELL_LIVE | CELL_EXPIRING => {
                let timestamp = Timestamp::decode(buf)?;
                let value = Bytes::decode(buf)?;
                let expiry = if tag == CELL_EXPIRING {
                    let expiry = GcTime::decode(buf)?;
                    let ttl = Ttl::decode(buf)?;
                    Some(Expiry { expiry, ttl })
                } else {
                    None
                };
                Ok(AtomicCell::Live {
                    timestamp,
                    value,
                    expiry,
                })
            }
            CELL_DEAD => {
                let timestamp = Timestamp::decode(buf)?;
                let deletion_time = GcTime::decode(buf)?;
                Ok(AtomicCell::dead(timestamp, deletion_time))
            }
            tag => Err(CodecError::UnknownTag {
                what: "atomic cell",
                tag,
            }),
        }
    }
}

const MARKER_MISSING: u8 = 0;
const MARKER_LIVE: u8 = 1;
const MARKER_EXPIRING: u8 = 2;
const MARKER_DEAD: u8 = 3;

impl Encode for RowMarker {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        match self {
            RowMarker::Missing => buf.put_u8(MARKER_MISSING),
            RowMarker::Live {
                timestamp,
                expiry: None,
            } => {
                buf.put_u8(MARKER_LIVE);
                timestamp.encode(buf);
            }
            RowMarker::Live {
                timestamp,
                expiry: Some(e),
            } => {
                buf.put_u8(MARKER_EXPIRING);
                timestamp.encode(buf);
                e.expiry.encode(buf);
                e.ttl.encode(buf);
            }
            RowMarker::Dead {
                timestamp,
                deletion_time,
            } => {
                buf.put_u8(MARKER_DEAD);
                timestamp.encode(buf);
                deletion_time.encode(buf);
            }
        }
    }

    fn size(&self) -> usize {
        1 + match self {
            RowMarker::Missing => 0,
            RowMarker::Live { expiry: None, .. } => 8,
            RowMarker::Live { expiry: Some(_), .. } => 16,
            RowMarker::Dead { .. } => 12,
        }
    }
}

impl Decode for RowMarker {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        match u8::decode(buf)? {
            MARKER_MISSING => Ok(RowMarker::Missing),
            MARKER_LIVE => Ok(RowMarker::live(Timestamp::decode(buf)?)),
            MARKER_EXPIRING => {
                let timestamp = Timestamp::decode(buf)?;
                let expiry = GcTime::decode(buf)?;
                let ttl = Ttl::decode(buf)?;
                Ok(RowMarker::expiring(timestamp, expiry, ttl))
            }
            MARKER_DEAD => {
                let timestamp = Timestamp::decode(buf)?;
                let deletion_time = GcTime::decode(buf)?;
                Ok(RowMarker::dead(timestamp, deletion_time))
            }
            tag => Err(CodecError::UnknownTag {
                what: "row marker",
                tag,
            }),
        }
    }
}

impl Encode for CollectionMutation {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        self.tomb.encode(buf);
        encode_seq(self.cells.iter(), buf);
    }

    fn size(&self) -> usize {
        self.tomb.size() + 4 + self.cells.iter().map(Encode::size).sum::<usize>()
    }
}

impl Decode for CollectionMutation {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let tomb = Tombstone::decode(buf)?;
        let cells: Vec<(Bytes, AtomicCell)> = decode_seq(buf)?;
        let mut m = CollectionMutation::deleted(tomb);
        for (key, cell) in cells {
            m.insert(key, cell);
        }
        Ok(m)
    }
}

const VALUE_ATOMIC: u8 = 0;
const VALUE_COLLECTION: u8 = 1;

impl Encode for CellOrCollection {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        match self {
            CellOrCollection::Atomic(cell) => {
                buf.put_u8(VALUE_ATOMIC);
                cell.encode(buf);
            }
            CellOrCollection::Collection(m) => {
                buf.put_u8(VALUE_COLLECTION);
                m.encode(buf);
            }
        }
    }

    fn size(&self) -> usize {
        1 + match self {
            CellOrCollection::Atomic(cell) => cell.size(),
            CellOrCollection::Collection(m) => m.size(),
        }
    }
}

impl Decode for CellOrCollection {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        match u8::decode(buf)? {
            VALUE_ATOMIC => AtomicCell::decode(buf).map(CellOrCollection::Atomic),
            VALUE_COLLECTION => CollectionMutation::decode(buf).map(CellOrCollection::Collection),
            tag => Err(CodecError::UnknownTag {
                what: "cell value",
                tag,
            }),
        }
    }
}
