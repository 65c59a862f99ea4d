use crate::error::TreeError;
use crate::iter::{Iter, Value};
use crate::node::Node;
use crate::payload::Payload;
use crate::registry::Registry;
use crate::wire;
use std::fmt;
use std::io::{Read, Write};

/// A string-keyed prefix tree holding a [`Payload`] per key.
///
/// Keys that are prefixes of one another coexist: `"ab"` and `"abc"` are
/// two independent entries sharing a path. Enumeration yields keys in
/// lexicographic code point order.
///
/// `StrTree` is not internally synchronized. Share it across threads behind
/// your own lock if more than one writer needs it.
///
/// # Examples
///
/// ```
/// use sovran_strtree::{Payload, StrTree, TreeError};
///
/// let mut tree = StrTree::new();
/// tree.set("cat", "meow");
/// tree.set("car", "vroom");
/// tree.set("cart", 42i32);
///
/// assert_eq!(tree.get("cart")?, &Payload::I32(42));
/// assert!(matches!(tree.get("ca"), Err(TreeError::NotFound(_))));
///
/// let keys: Vec<String> = tree.keys();
/// assert_eq!(keys, vec!["car", "cart", "cat"]);
/// # Ok::<(), TreeError>(())
/// ```
#[derive(Clone, Default)]
pub struct StrTree {
    root: Node,
    len: usize,
}

impl StrTree {
    /// Creates a new, empty tree.
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            len: 0,
        }
    }

    /// Returns the payload stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::NotFound` if the key was never set.
    pub fn get(&self, key: &str) -> Result<&Payload, TreeError> {
        self.root.get(key)
    }

    /// Returns the payload stored at `key` for in-place modification.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::NotFound` if the key was never set.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut Payload, TreeError> {
        self.root.get_mut(key)
    }

    /// Returns the value stored at `key` as a `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_strtree::{StrTree, TreeError};
    ///
    /// let mut tree = StrTree::new();
    /// tree.set("port", 8080u16);
    ///
    /// assert_eq!(tree.get_as::<u16>("port")?, &8080);
    /// assert!(matches!(tree.get_as::<String>("port"), Err(TreeError::TypeMismatch)));
    /// # Ok::<(), TreeError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// - Returns `TreeError::NotFound` if the key was never set
    /// - Returns `TreeError::TypeMismatch` if the stored value is not a `T`
    pub fn get_as<T: 'static>(&self, key: &str) -> Result<&T, TreeError> {
        self.get(key)?
            .downcast_ref::<T>()
            .ok_or(TreeError::TypeMismatch)
    }

    /// Checks if a payload is stored at `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.root.get(key).is_ok()
    }

    /// Stores `value` at `key`, returning the payload it replaced.
    pub fn set(&mut self, key: &str, value: impl Into<Payload>) -> Option<Payload> {
        let previous = self.root.set(key, value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Removes the payload at `key` and prunes the path left empty behind it.
    ///
    /// Returns the removed payload, or `None` if the key was not present.
    pub fn remove(&mut self, key: &str) -> Option<Payload> {
        let removed = self.root.remove(key);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Returns every entry in key order.
    pub fn list(&self) -> Vec<Value<'_>> {
        self.root.list()
    }

    /// Iterates over every entry in key order without collecting them first.
    pub fn iter(&self) -> Iter<'_> {
        self.root.iter()
    }

    /// Returns every key in order.
    pub fn keys(&self) -> Vec<String> {
        self.iter().map(|value| value.key).collect()
    }

    /// Gets the number of stored payloads.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Serializes the tree with the codecs in `registry`.
    ///
    /// # Errors
    ///
    /// - Returns `TreeError::UnregisteredType` if a payload's type has no codec in `registry`
    /// - Returns `TreeError::Codec` if a codec fails to marshal its value
    pub fn encode(&self, registry: &Registry) -> Result<Vec<u8>, TreeError> {
        let mut out = Vec::new();
        wire::encode(&self.root, registry, &mut out)?;
        Ok(out)
    }

    /// Serializes the tree into `writer`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`StrTree::encode`], or `TreeError::Io` if the
    /// writer fails.
    pub fn write_to<W: Write>(&self, registry: &Registry, mut writer: W) -> Result<(), TreeError> {
        writer.write_all(&self.encode(registry)?)?;
        writer.flush()?;
        Ok(())
    }

    /// Rebuilds a tree from bytes produced by [`StrTree::encode`].
    ///
    /// Decoding is all or nothing: any error discards the partial tree.
    ///
    /// # Errors
    ///
    /// - Returns `TreeError::UnregisteredType` if a payload tag has no codec in `registry`
    /// - Returns `TreeError::MalformedStream` if the bytes are truncated or corrupt
    pub fn decode(registry: &Registry, bytes: &[u8]) -> Result<Self, TreeError> {
        let root = wire::decode(bytes, registry)?;
        let len = root.iter().count();
        Ok(Self { root, len })
    }

    /// Reads `reader` to the end and decodes the tree it holds.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`StrTree::decode`], or `TreeError::Io` if the
    /// reader fails.
    pub fn read_from<R: Read>(registry: &Registry, mut reader: R) -> Result<Self, TreeError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::decode(registry, &bytes)
    }
}

impl fmt::Debug for StrTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|value| (value.key, value.data)))
            .finish()
    }
}

impl fmt::Display for StrTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

impl<'a> IntoIterator for &'a StrTree {
    type Item = Value<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: AsRef<str>, V: Into<Payload>> Extend<(K, V)> for StrTree {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key.as_ref(), value);
        }
    }
}

impl<K: AsRef<str>, V: Into<Payload>> FromIterator<(K, V)> for StrTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = StrTree::new();
        tree.extend(iter);
        tree
    }
}
