use crate::{SerdeErr, WireBuffer};

/// A type that can write itself to and read itself back from a [`WireBuffer`]
pub trait Serde: Sized {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr>;

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr>;
}

macro_rules! impl_serde_for_primitive {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
                    writer.write(*self)
                }

                fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
                    reader.read()
                }
            }
        )*
    };
}

impl_serde_for_primitive!(bool, u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Serde for String {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
        writer.write_string(self)
    }

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
        reader.read_string()
    }
}

/// A `u32` written with the 7-bit variable-length encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VarU32(pub u32);

impl Serde for VarU32 {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
        writer.write_var_u32(self.0)
    }

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
        reader.read_var_u32().map(VarU32)
    }
}
