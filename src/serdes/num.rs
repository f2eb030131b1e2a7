use bytes::{Buf, BufMut};

use super::{ensure_remaining, Decode, Encode};
use crate::error::CodecError;

macro_rules! implement_num {
    ($($ty:ty => $put:ident, $get:ident);* $(;)?) => {
        $(
            impl Encode for $ty {
                fn encode<B: BufMut>(&self, buf: &mut B) {
                    buf.$put(*self);
                }

                fn size(&self) -> usize {
                    std::mem::size_of::<$ty>()
                }
            }

            impl Decode for $ty {
                fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
                    ensure_remaining(buf, std::mem::size_of::<$ty>())?;
                    Ok(buf.$get())
                }
            }
        )*
    };
}

implement_num! {
    u8 => put_u8, get_u8;
    u16 => put_u16, get_u16;
    u32 => put_u32, get_u32;
    i64 => put_i64, get_i64;
}
