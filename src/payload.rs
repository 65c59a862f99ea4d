use crate::codec::Codec;
use crate::type_tag::TypeTag;
use std::any::Any;
use std::fmt;

/// A value stored at a key.
///
/// Built-in primitives have their own variants and are persisted through the
/// registry's wrapper codecs. Anything else goes in [`Payload::Custom`] as a
/// type implementing [`Codec`].
///
/// # Examples
///
/// ```
/// use sovran_strtree::Payload;
///
/// let number = Payload::from(42u32);
/// assert!(number.is::<u32>());
/// assert_eq!(number.downcast_ref::<u32>(), Some(&42));
/// assert_eq!(number.downcast_ref::<u64>(), None);
///
/// let text: Payload = "meow".into();
/// assert_eq!(text.as_str(), Some("meow"));
/// assert_eq!(text.to_string(), "\"meow\"");
/// ```
#[derive(Debug, Clone)]
pub enum Payload {
    Str(String),
    Bytes(Vec<u8>),
    Usize(usize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Isize(isize),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    /// A user type that marshals itself
    Custom(Box<dyn Codec>),
}

impl Payload {
    /// Wraps a user codec.
    pub fn custom<C: Codec>(codec: C) -> Self {
        Payload::Custom(Box::new(codec))
    }

    /// Short name of the kind of value held
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Str(_) => "string",
            Payload::Bytes(_) => "bytes",
            Payload::Usize(_) => "usize",
            Payload::U8(_) => "u8",
            Payload::U16(_) => "u16",
            Payload::U32(_) => "u32",
            Payload::U64(_) => "u64",
            Payload::Isize(_) => "isize",
            Payload::I8(_) => "i8",
            Payload::I16(_) => "i16",
            Payload::I32(_) => "i32",
            Payload::I64(_) => "i64",
            Payload::F32(_) => "f32",
            Payload::F64(_) => "f64",
            Payload::Bool(_) => "bool",
            Payload::Custom(_) => "custom",
        }
    }

    /// Tag of the Rust type held.
    ///
    /// For primitives this is the tag of the bare type (`u8`, `String`, ...),
    /// which the registry maps to a wrapper codec. A custom payload reports
    /// its codec's own tag.
    pub fn natural_tag(&self) -> TypeTag {
        match self {
            Payload::Str(_) => TypeTag::of::<String>(),
            Payload::Bytes(_) => TypeTag::of::<Vec<u8>>(),
            Payload::Usize(_) => TypeTag::of::<usize>(),
            Payload::U8(_) => TypeTag::of::<u8>(),
            Payload::U16(_) => TypeTag::of::<u16>(),
            Payload::U32(_) => TypeTag::of::<u32>(),
            Payload::U64(_) => TypeTag::of::<u64>(),
            Payload::Isize(_) => TypeTag::of::<isize>(),
            Payload::I8(_) => TypeTag::of::<i8>(),
            Payload::I16(_) => TypeTag::of::<i16>(),
            Payload::I32(_) => TypeTag::of::<i32>(),
            Payload::I64(_) => TypeTag::of::<i64>(),
            Payload::F32(_) => TypeTag::of::<f32>(),
            Payload::F64(_) => TypeTag::of::<f64>(),
            Payload::Bool(_) => TypeTag::of::<bool>(),
            Payload::Custom(codec) => codec.type_tag(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        match self {
            Payload::Str(v) => v as &dyn Any,
            Payload::Bytes(v) => v as &dyn Any,
            Payload::Usize(v) => v as &dyn Any,
            Payload::U8(v) => v as &dyn Any,
            Payload::U16(v) => v as &dyn Any,
            Payload::U32(v) => v as &dyn Any,
            Payload::U64(v) => v as &dyn Any,
            Payload::Isize(v) => v as &dyn Any,
            Payload::I8(v) => v as &dyn Any,
            Payload::I16(v) => v as &dyn Any,
            Payload::I32(v) => v as &dyn Any,
            Payload::I64(v) => v as &dyn Any,
            Payload::F32(v) => v as &dyn Any,
            Payload::F64(v) => v as &dyn Any,
            Payload::Bool(v) => v as &dyn Any,
            Payload::Custom(codec) => codec.as_any(),
        }
    }

    /// Check if the held value is of type T
    pub fn is<T: 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Get a reference to the held value if it is of type T
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Get a mutable reference to the held value if it is of type T
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        match self {
            Payload::Custom(codec) => codec.as_any_mut().downcast_mut::<T>(),
            Payload::Str(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::Bytes(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::Usize(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::U8(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::U16(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::U32(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::U64(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::Isize(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::I8(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::I16(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::I32(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::I64(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::F32(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::F64(v) => (v as &mut dyn Any).downcast_mut::<T>(),
            Payload::Bool(v) => (v as &mut dyn Any).downcast_mut::<T>(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn marshaled(codec: &dyn Codec) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    codec.marshal(&mut out).ok()?;
    Some(out)
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Str(a), Payload::Str(b)) => a == b,
            (Payload::Bytes(a), Payload::Bytes(b)) => a == b,
            (Payload::Usize(a), Payload::Usize(b)) => a == b,
            (Payload::U8(a), Payload::U8(b)) => a == b,
            (Payload::U16(a), Payload::U16(b)) => a == b,
            (Payload::U32(a), Payload::U32(b)) => a == b,
            (Payload::U64(a), Payload::U64(b)) => a == b,
            (Payload::Isize(a), Payload::Isize(b)) => a == b,
            (Payload::I8(a), Payload::I8(b)) => a == b,
            (Payload::I16(a), Payload::I16(b)) => a == b,
            (Payload::I32(a), Payload::I32(b)) => a == b,
            (Payload::I64(a), Payload::I64(b)) => a == b,
            (Payload::F32(a), Payload::F32(b)) => a == b,
            (Payload::F64(a), Payload::F64(b)) => a == b,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            // Custom values have no PartialEq bound; compare what they would persist.
            (Payload::Custom(a), Payload::Custom(b)) => {
                a.type_tag() == b.type_tag()
                    && matches!((marshaled(&**a), marshaled(&**b)), (Some(x), Some(y)) if x == y)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Payload::Str(v) => write!(f, "{:?}", v),
            Payload::Bytes(v) => write!(f, "{:?}", v),
            Payload::Usize(v) => write!(f, "{}", v),
            Payload::U8(v) => write!(f, "{}", v),
            Payload::U16(v) => write!(f, "{}", v),
            Payload::U32(v) => write!(f, "{}", v),
            Payload::U64(v) => write!(f, "{}", v),
            Payload::Isize(v) => write!(f, "{}", v),
            Payload::I8(v) => write!(f, "{}", v),
            Payload::I16(v) => write!(f, "{}", v),
            Payload::I32(v) => write!(f, "{}", v),
            Payload::I64(v) => write!(f, "{}", v),
            Payload::F32(v) => write!(f, "{}", v),
            Payload::F64(v) => write!(f, "{}", v),
            Payload::Bool(v) => write!(f, "{}", v),
            Payload::Custom(codec) => write!(f, "{:?}", codec),
        }
    }
}

macro_rules! payload_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Payload {
                fn from(value: $ty) -> Self {
                    Payload::$variant(value)
                }
            }
        )*
    };
}

payload_from! {
    String => Str,
    Vec<u8> => Bytes,
    usize => Usize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    isize => Isize,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    Box<dyn Codec> => Custom,
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Str(value.to_string())
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Payload::Bytes(value.to_vec())
    }
}
