use crate::codec::{builtin_natives, Codec, NativeCodec, NativeFactory};
use crate::error::{CodecError, TreeError};
use crate::payload::Payload;
use crate::type_tag::TypeTag;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

enum Slot {
    /// Wrapper for a built-in primitive kind
    Native(NativeFactory),
    /// Prototype of a self-describing user type, cloned for every decode
    Custom(Box<dyn Codec>),
}

struct Entry {
    name: &'static str,
    /// Concrete Rust type of the codec, so two types can't share a name
    type_id: TypeId,
    slot: Slot,
}

/// The set of codecs a tree can be persisted with.
///
/// A registry maps each [`TypeTag`] written to a stream to the codec able to
/// read it back. [`Registry::new`] comes with wrappers for every primitive
/// [`Payload`] kind; custom types are added with [`Registry::register`].
/// Encoding and decoding take the registry explicitly, so two registries
/// never interfere with each other.
///
/// # Examples
///
/// ```
/// use sovran_strtree::{Registry, StrTree, TreeError};
///
/// let registry = Registry::new();
///
/// let mut tree = StrTree::new();
/// tree.set("answer", 42u64);
///
/// let bytes = tree.encode(&registry)?;
/// let restored = StrTree::decode(&registry, &bytes)?;
/// assert_eq!(restored.get_as::<u64>("answer")?, &42);
/// # Ok::<(), TreeError>(())
/// ```
pub struct Registry {
    codecs: HashMap<TypeTag, Entry>,
    /// Natural tag of a bare primitive -> tag of its wrapper codec
    natives: HashMap<TypeTag, TypeTag>,
}

/// A fresh codec instance ready to marshal or unmarshal one payload.
pub(crate) enum Instance {
    Native(Box<dyn NativeCodec>),
    Custom(Box<dyn Codec>),
}

impl Instance {
    pub(crate) fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        match self {
            Instance::Native(codec) => codec.unmarshal(bytes),
            Instance::Custom(codec) => codec.unmarshal(bytes),
        }
    }

    /// Wrapper codecs hand back the bare primitive; custom codecs are the value.
    pub(crate) fn into_payload(self) -> Payload {
        match self {
            Instance::Native(codec) => codec.get(),
            Instance::Custom(codec) => Payload::Custom(codec),
        }
    }
}

impl Registry {
    /// Creates a registry holding the wrapper codecs for every primitive kind.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (natural, factory) in builtin_natives() {
            let wrapper = factory();
            let name = wrapper.type_name();
            let tag = TypeTag::from_name(name);
            registry.codecs.insert(
                tag,
                Entry {
                    name,
                    type_id: wrapper.as_any().type_id(),
                    slot: Slot::Native(factory),
                },
            );
            registry.natives.insert(natural, tag);
        }
        registry
    }

    /// Creates a registry with no codecs at all, not even the primitive wrappers.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
            natives: HashMap::new(),
        }
    }

    /// Registers a codec type, using `prototype` to create fresh instances
    /// whenever a payload with its tag is decoded.
    ///
    /// Registering the same type again replaces the prototype. Registering one
    /// of the built-in wrappers is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::InvalidRegistration` if the codec's tag is the
    /// reserved absent marker, or if the tag is already held by a different
    /// type name or by a different Rust type claiming the same name.
    pub fn register<C: Codec + Clone>(&mut self, prototype: C) -> Result<TypeTag, TreeError> {
        let name = prototype.type_name();
        let tag = prototype.type_tag();
        let type_id = TypeId::of::<C>();

        if tag.is_absent() {
            warn!(name, "codec tag is the reserved absent marker");
            return Err(TreeError::InvalidRegistration(format!(
                "{} hashes to the reserved absent tag",
                name
            )));
        }

        if let Some(existing) = self.codecs.get(&tag) {
            if existing.name != name {
                warn!(name, existing = existing.name, %tag, "codec tag collision");
                return Err(TreeError::InvalidRegistration(format!(
                    "{} and {} share type tag {}",
                    name, existing.name, tag
                )));
            }
            if existing.type_id != type_id {
                warn!(name, %tag, "codec name claimed by another type");
                return Err(TreeError::InvalidRegistration(format!(
                    "{} is already registered by a different type",
                    name
                )));
            }
            if matches!(existing.slot, Slot::Native(_)) {
                debug!(name, %tag, "codec is already a built-in wrapper");
                return Ok(tag);
            }
        }

        debug!(name, %tag, "registered codec");
        self.codecs.insert(
            tag,
            Entry {
                name,
                type_id,
                slot: Slot::Custom(Box::new(prototype)),
            },
        );
        Ok(tag)
    }

    /// Returns true if a codec is registered under `tag`
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.codecs.contains_key(&tag)
    }

    /// Returns the wrapper codec tag for a bare primitive's natural tag
    pub fn wrapper_for(&self, natural: TypeTag) -> Option<TypeTag> {
        self.natives.get(&natural).copied()
    }

    /// Returns the type name registered under `tag`
    pub fn name_of(&self, tag: TypeTag) -> Option<&'static str> {
        self.codecs.get(&tag).map(|entry| entry.name)
    }

    /// Returns every registered tag, sorted
    pub fn tags(&self) -> Vec<TypeTag> {
        let mut tags: Vec<TypeTag> = self.codecs.keys().copied().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Creates a fresh codec for decoding a payload written under `tag`.
    pub(crate) fn instantiate(&self, tag: TypeTag) -> Result<Instance, TreeError> {
        let entry = self
            .codecs
            .get(&tag)
            .ok_or(TreeError::UnregisteredType(tag))?;
        Ok(match &entry.slot {
            Slot::Native(factory) => Instance::Native(factory()),
            Slot::Custom(prototype) => Instance::Custom(prototype.box_clone()),
        })
    }

    /// Resolves the tag to write for `payload` and marshals it into `out`.
    pub(crate) fn marshal(
        &self,
        payload: &Payload,
        out: &mut Vec<u8>,
    ) -> Result<TypeTag, TreeError> {
        let natural = payload.natural_tag();
        match payload {
            Payload::Custom(codec) => {
                if !self.contains(natural) {
                    return Err(TreeError::UnregisteredType(natural));
                }
                codec.marshal(out)?;
                Ok(natural)
            }
            primitive => {
                let tag = self
                    .wrapper_for(natural)
                    .ok_or(TreeError::UnregisteredType(natural))?;
                match self.instantiate(tag)? {
                    Instance::Native(mut wrapper) => {
                        wrapper.set(primitive)?;
                        wrapper.marshal(out)?;
                        Ok(tag)
                    }
                    // register() never replaces a wrapper slot
                    Instance::Custom(_) => Err(TreeError::UnregisteredType(tag)),
                }
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names: Vec<&'static str> = self.codecs.values().map(|entry| entry.name).collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("codecs", &names).finish()
    }
}
