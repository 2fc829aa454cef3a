use rally_serde::{Serde, SerdeErr, WireBuffer};

use super::error::HandlerError;

/// One dynamically typed invocation argument
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Bool(bool),
    U8(u8),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Arg {
    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Bool(_) => "bool",
            Arg::U8(_) => "u8",
            Arg::I32(_) => "i32",
            Arg::I64(_) => "i64",
            Arg::F32(_) => "f32",
            Arg::F64(_) => "f64",
            Arg::Str(_) => "string",
            Arg::Bytes(_) => "bytes",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Arg::Bool(_) => 0,
            Arg::U8(_) => 1,
            Arg::I32(_) => 2,
            Arg::I64(_) => 3,
            Arg::F32(_) => 4,
            Arg::F64(_) => 5,
            Arg::Str(_) => 6,
            Arg::Bytes(_) => 7,
        }
    }
}

impl Serde for Arg {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
        writer.write_u8(self.tag())?;
        match self {
            Arg::Bool(value) => writer.write_bool(*value),
            Arg::U8(value) => writer.write_u8(*value),
            Arg::I32(value) => writer.write_i32(*value),
            Arg::I64(value) => writer.write_i64(*value),
            Arg::F32(value) => writer.write_f32(*value),
            Arg::F64(value) => writer.write_f64(*value),
            Arg::Str(value) => writer.write_string(value),
            Arg::Bytes(value) => writer.write_prefixed_bytes(value),
        }
    }

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
        match reader.read_u8()? {
            0 => Ok(Arg::Bool(reader.read_bool()?)),
            1 => Ok(Arg::U8(reader.read_u8()?)),
            2 => Ok(Arg::I32(reader.read_i32()?)),
            3 => Ok(Arg::I64(reader.read_i64()?)),
            4 => Ok(Arg::F32(reader.read_f32()?)),
            5 => Ok(Arg::F64(reader.read_f64()?)),
            6 => Ok(Arg::Str(reader.read_string()?)),
            7 => Ok(Arg::Bytes(reader.read_prefixed_bytes()?.to_vec())),
            tag => Err(SerdeErr::UnknownTag {
                tag,
                type_name: "Arg",
            }),
        }
    }
}

macro_rules! impl_arg_conversions {
    ($($ty:ty => $variant:ident, $name:literal);* $(;)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::$variant(value)
                }
            }

            impl FromArg for $ty {
                const TYPE_NAME: &'static str = $name;

                fn from_arg(arg: &Arg) -> Option<Self> {
                    match arg {
                        Arg::$variant(value) => Some(value.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

/// Extracts a typed value out of an [`Arg`]
pub trait FromArg: Sized {
    const TYPE_NAME: &'static str;

    fn from_arg(arg: &Arg) -> Option<Self>;
}

impl_arg_conversions!(
    bool => Bool, "bool";
    u8 => U8, "u8";
    i32 => I32, "i32";
    i64 => I64, "i64";
    f32 => F32, "f32";
    f64 => F64, "f64";
    String => Str, "string";
    Vec<u8> => Bytes, "bytes";
);

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_owned())
    }
}

impl From<&[u8]> for Arg {
    fn from(value: &[u8]) -> Self {
        Arg::Bytes(value.to_vec())
    }
}

/// The positional arguments of one call. Its length is the call's arity
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args(Vec<Arg>);

impl Args {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_vec(args: Vec<Arg>) -> Self {
        Self(args)
    }

    pub fn push(&mut self, arg: impl Into<Arg>) {
        self.0.push(arg.into());
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn raw(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    /// Reads argument `index` as `T`
    pub fn get<T: FromArg>(&self, index: usize) -> Result<T, HandlerError> {
        let arg = self.0.get(index).ok_or(HandlerError::MissingArgument {
            index,
            arity: self.0.len(),
        })?;
        T::from_arg(arg).ok_or(HandlerError::ArgumentType {
            index,
            expected: T::TYPE_NAME,
            found: arg.type_name(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arg> {
        self.0.iter()
    }
}

impl Serde for Args {
    fn ser(&self, writer: &mut WireBuffer) -> Result<(), SerdeErr> {
        if self.0.len() > u8::MAX as usize {
            return Err(SerdeErr::InvalidLength {
                length: self.0.len(),
                element_size: 1,
            });
        }
        writer.write_u8(self.0.len() as u8)?;
        for arg in &self.0 {
            arg.ser(writer)?;
        }
        Ok(())
    }

    fn de(reader: &mut WireBuffer) -> Result<Self, SerdeErr> {
        let count = reader.read_u8()?;
        let mut args = Vec::with_capacity(count as usize);
        for _ in 0..count {
            args.push(Arg::de(reader)?);
        }
        Ok(Self(args))
    }
}

/// Builds [`Args`] from a list of convertible values
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::from_vec(vec![$($crate::Arg::from($value)),+])
    };
}
