use crate::error::CodecError;
use crate::payload::Payload;
use crate::type_tag::TypeTag;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt::Debug;

/// A value that knows how to turn itself into bytes and back.
///
/// Implement `Codec` on your own type (and derive or implement `Clone`) to
/// store it in a [`StrTree`](crate::StrTree) as a [`Payload::Custom`] and
/// persist it. The type must also be registered with a
/// [`Registry`](crate::Registry) so that it can be recognized when a stream
/// is decoded.
///
/// # Examples
///
/// ```
/// use sovran_strtree::{Codec, CodecError, Payload, Registry, StrTree, TreeError};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// impl Codec for Point {
///     fn marshal(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
///         out.extend_from_slice(&self.x.to_le_bytes());
///         out.extend_from_slice(&self.y.to_le_bytes());
///         Ok(())
///     }
///
///     fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
///         let bytes: [u8; 8] = bytes
///             .try_into()
///             .map_err(|_| CodecError::Custom("a point is 8 bytes".to_string()))?;
///         self.x = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
///         self.y = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
///         Ok(())
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.register(Point::default())?;
///
/// let mut tree = StrTree::new();
/// tree.set("origin", Payload::custom(Point { x: 0, y: 0 }));
///
/// let restored = StrTree::decode(&registry, &tree.encode(&registry)?)?;
/// assert_eq!(restored.get_as::<Point>("origin")?, &Point { x: 0, y: 0 });
/// # Ok::<(), TreeError>(())
/// ```
pub trait Codec: Any + Debug + Send + Sync + CodecBase {
    /// Appends the marshaled form of `self` to `out`.
    fn marshal(&self, out: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Replaces the contents of `self` with the value marshaled in `bytes`.
    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError>;

    /// The name hashed into this codec's [`TypeTag`].
    ///
    /// Defaults to [`std::any::type_name`]. Override it with a fixed string
    /// if streams must stay readable after the type is renamed or moved.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::from_name(self.type_name())
    }
}

/// Object-safe helpers every [`Codec`] gets for free when it is `Clone`.
pub trait CodecBase {
    fn box_clone(&self) -> Box<dyn Codec>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Codec + Clone> CodecBase for T {
    fn box_clone(&self) -> Box<dyn Codec> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn Codec> {
    fn clone(&self) -> Self {
        (**self).box_clone()
    }
}

/// A codec that wraps a bare primitive so it can be marshaled.
///
/// Primitive payloads do not describe themselves; before encoding, the
/// registry picks the wrapper that matches the payload's kind, hands it the
/// value with [`set`](NativeCodec::set), and marshals the wrapper. Decoding
/// runs the other way and unwraps with [`get`](NativeCodec::get).
pub trait NativeCodec: Codec {
    /// Wraps `value`, failing if it is not the kind this codec holds.
    fn set(&mut self, value: &Payload) -> Result<(), CodecError>;

    /// Returns the held value as a bare payload.
    fn get(&self) -> Payload;
}

pub(crate) type NativeFactory = fn() -> Box<dyn NativeCodec>;

fn factory<C: NativeCodec + Default>() -> Box<dyn NativeCodec> {
    Box::new(C::default())
}

fn marshal_value<T: Serialize>(value: &T, out: &mut Vec<u8>) -> Result<(), CodecError> {
    out.extend(postcard::to_stdvec(value)?);
    Ok(())
}

fn unmarshal_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let (value, rest) = postcard::take_from_bytes(bytes)?;
    if !rest.is_empty() {
        return Err(CodecError::Custom(format!(
            "{} trailing bytes after value",
            rest.len()
        )));
    }
    Ok(value)
}

macro_rules! wrapper_codec {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $variant:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            data: $ty,
        }

        impl Codec for $name {
            fn marshal(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
                marshal_value(&self.data, out)
            }

            fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
                self.data = unmarshal_value(bytes)?;
                Ok(())
            }

            fn type_name(&self) -> &'static str {
                concat!("sovran_strtree::codec::", stringify!($name))
            }
        }

        impl NativeCodec for $name {
            fn set(&mut self, value: &Payload) -> Result<(), CodecError> {
                match value {
                    Payload::$variant(data) => {
                        self.data = data.clone();
                        Ok(())
                    }
                    other => Err(CodecError::WrongKind {
                        expected: $kind,
                        found: other.kind(),
                    }),
                }
            }

            fn get(&self) -> Payload {
                Payload::$variant(self.data.clone())
            }
        }
    };
}

wrapper_codec!(
    /// Wraps [`Payload::Str`]
    StrCodec, String, Str, "string"
);
wrapper_codec!(
    /// Wraps [`Payload::Bytes`]
    BytesCodec, Vec<u8>, Bytes, "bytes"
);
wrapper_codec!(
    /// Wraps [`Payload::Usize`], written as a varint so it reads back on any pointer width
    UsizeCodec, usize, Usize, "usize"
);
wrapper_codec!(U8Codec, u8, U8, "u8");
wrapper_codec!(U16Codec, u16, U16, "u16");
wrapper_codec!(U32Codec, u32, U32, "u32");
wrapper_codec!(U64Codec, u64, U64, "u64");
wrapper_codec!(
    /// Wraps [`Payload::Isize`], written as a zigzag varint
    IsizeCodec, isize, Isize, "isize"
);
wrapper_codec!(I8Codec, i8, I8, "i8");
wrapper_codec!(I16Codec, i16, I16, "i16");
wrapper_codec!(I32Codec, i32, I32, "i32");
wrapper_codec!(I64Codec, i64, I64, "i64");
wrapper_codec!(F32Codec, f32, F32, "f32");
wrapper_codec!(F64Codec, f64, F64, "f64");
wrapper_codec!(BoolCodec, bool, Bool, "bool");

/// Natural tag of each primitive kind paired with the wrapper that carries it.
pub(crate) fn builtin_natives() -> [(TypeTag, NativeFactory); 15] {
    [
        (TypeTag::of::<String>(), factory::<StrCodec> as NativeFactory),
        (TypeTag::of::<Vec<u8>>(), factory::<BytesCodec> as NativeFactory),
        (TypeTag::of::<usize>(), factory::<UsizeCodec> as NativeFactory),
        (TypeTag::of::<u8>(), factory::<U8Codec> as NativeFactory),
        (TypeTag::of::<u16>(), factory::<U16Codec> as NativeFactory),
        (TypeTag::of::<u32>(), factory::<U32Codec> as NativeFactory),
        (TypeTag::of::<u64>(), factory::<U64Codec> as NativeFactory),
        (TypeTag::of::<isize>(), factory::<IsizeCodec> as NativeFactory),
        (TypeTag::of::<i8>(), factory::<I8Codec> as NativeFactory),
        (TypeTag::of::<i16>(), factory::<I16Codec> as NativeFactory),
        (TypeTag::of::<i32>(), factory::<I32Codec> as NativeFactory),
        (TypeTag::of::<i64>(), factory::<I64Codec> as NativeFactory),
        (TypeTag::of::<f32>(), factory::<F32Codec> as NativeFactory),
        (TypeTag::of::<f64>(), factory::<F64Codec> as NativeFactory),
        (TypeTag::of::<bool>(), factory::<BoolCodec> as NativeFactory),
    ]
}
