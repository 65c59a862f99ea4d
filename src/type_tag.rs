use md5::{Digest, Md5};
use std::any::type_name;
use std::fmt;

/// A short, deterministic identifier for a payload type.
///
/// The tag is the 16-byte MD5 digest of a type name folded down to 8 bytes
/// by XOR-ing byte `i` with byte `i + 8`. The same name yields the same tag
/// in every process, so tags can be written to a stream and matched against
/// a [`Registry`](crate::Registry) on load.
///
/// Distinct names can fold to the same tag. The registry refuses to hold two
/// codecs whose names collide, but two processes with different registries
/// can still disagree about what a tag means.
///
/// # Examples
///
/// ```
/// use sovran_strtree::TypeTag;
///
/// let a = TypeTag::from_name("my_app::Point");
/// let b = TypeTag::from_name("my_app::Point");
/// assert_eq!(a, b);
/// assert_ne!(a, TypeTag::ABSENT);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag([u8; TypeTag::LEN]);

impl TypeTag {
    /// Width of a tag on the wire
    pub const LEN: usize = 8;

    /// Reserved marker written in place of a tag when a node has no payload.
    pub const ABSENT: TypeTag = TypeTag([0; TypeTag::LEN]);

    /// Derives the tag for a type name.
    pub fn from_name(name: &str) -> Self {
        let digest = Md5::digest(name.as_bytes());
        let mut folded = [0u8; TypeTag::LEN];
        for (i, byte) in digest.iter().enumerate() {
            folded[i % TypeTag::LEN] ^= byte;
        }
        TypeTag(folded)
    }

    /// Derives the tag for `T` from [`std::any::type_name`].
    ///
    /// `type_name` output is not guaranteed stable across compiler releases,
    /// so this is only used for in-process lookups. Codecs that write tags to
    /// a stream should override [`Codec::type_name`](crate::Codec::type_name)
    /// if they need stability across toolchains.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::from_name(type_name::<T>())
    }

    pub const fn from_bytes(bytes: [u8; TypeTag::LEN]) -> Self {
        TypeTag(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; TypeTag::LEN] {
        &self.0
    }

    pub fn is_absent(&self) -> bool {
        *self == TypeTag::ABSENT
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TypeTag({})", hex::encode(self.0))
    }
}
