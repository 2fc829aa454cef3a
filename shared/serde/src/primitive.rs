use std::mem::size_of;

mod sealed {
    pub trait Sealed {}
}

/// Fixed-size values that can be copied to and from the wire.
/// Every primitive is little-endian on the wire, regardless of host platform.
pub trait Primitive: Copy + sealed::Sealed {
    const SIZE: usize;

    fn write_le(self, out: &mut [u8]);

    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_primitive {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Primitive for $ty {
                const SIZE: usize = size_of::<$ty>();

                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl sealed::Sealed for bool {}

impl Primitive for bool {
    const SIZE: usize = 1;

    fn write_le(self, out: &mut [u8]) {
        out[0] = u8::from(self);
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}
