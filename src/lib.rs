//! # sovran-strtree
//!
//! A string-keyed prefix tree whose values can be of many types, and which
//! can be persisted to bytes and read back with every value's type intact.
//!
//! `sovran-strtree` stores a [`Payload`] at any key. Keys share storage
//! along common prefixes, a key may be a prefix of another, and enumeration
//! comes out in lexicographic order. Payloads are either built-in primitives
//! or your own types implementing [`Codec`], and a [`Registry`] of codecs
//! lets a whole tree round-trip through a byte stream.
//!
//! ## Key Features
//!
//! - **Prefix-sharing**: one node per character, children kept sorted for binary search
//! - **Heterogeneous**: strings, bytes, integers, floats, booleans and custom types side by side
//! - **Self-describing persistence**: each payload is written with a short type tag
//! - **No global state**: the codec registry is an ordinary value you construct and pass in
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_strtree::{Payload, StrTree, TreeError};
//!
//! fn main() -> Result<(), TreeError> {
//!     let mut tree = StrTree::new();
//!
//!     // Store values of different types
//!     tree.set("cat", "meow");
//!     tree.set("car", "vroom");
//!     tree.set("cart", 42i32);
//!
//!     // Retrieve them
//!     assert_eq!(tree.get("cat")?, &Payload::from("meow"));
//!     assert_eq!(tree.get_as::<i32>("cart")?, &42);
//!
//!     // "ca" is only a path to other keys
//!     match tree.get("ca") {
//!         Ok(value) => println!("Value: {}", value),
//!         Err(TreeError::NotFound(key)) => println!("Key ({}) doesn't exist", key),
//!         Err(e) => println!("Other error: {}", e),
//!     }
//!
//!     // Entries come back in key order
//!     for entry in &tree {
//!         println!("{}", entry);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Persisting a Tree
//!
//! ```rust
//! use sovran_strtree::{Registry, StrTree, TreeError};
//!
//! fn main() -> Result<(), TreeError> {
//!     let registry = Registry::new();
//!
//!     let mut tree = StrTree::new();
//!     tree.set("name", "sovran");
//!     tree.set("version", 3u8);
//!     tree.set("ratio", 0.5f64);
//!
//!     let bytes = tree.encode(&registry)?;
//!     let restored = StrTree::decode(&registry, &bytes)?;
//!
//!     assert_eq!(restored.list(), tree.list());
//!     assert_eq!(restored.get_as::<u8>("version")?, &3);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use sovran_strtree::{Registry, StrTree, TreeError};
//!
//! let mut tree = StrTree::new();
//! tree.set("flag", true);
//!
//! // Wrong type
//! match tree.get_as::<String>("flag") {
//!     Ok(value) => println!("Flag: {}", value),
//!     Err(TreeError::TypeMismatch) => println!("Flag is not a String"),
//!     Err(e) => println!("Other error: {}", e),
//! }
//!
//! // A registry without the primitive wrappers can't write the tree
//! match tree.encode(&Registry::empty()) {
//!     Ok(_) => println!("Encoded"),
//!     Err(TreeError::UnregisteredType(tag)) => println!("No codec for {}", tag),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```

mod codec;
mod error;
mod iter;
mod node;
mod payload;
mod registry;
mod tree;
mod type_tag;
mod wire;


pub use codec::{
    BoolCodec, BytesCodec, Codec, CodecBase, F32Codec, F64Codec, I16Codec, I32Codec, I64Codec,
    I8Codec, IsizeCodec, NativeCodec, StrCodec, U16Codec, U32Codec, U64Codec, U8Codec, UsizeCodec,
};
pub use error::{CodecError, TreeError};
pub use iter::{Iter, Value};
pub use node::{Fetch, Node, ROOT_CHAR};
pub use payload::Payload;
pub use registry::Registry;
pub use tree::StrTree;
pub use type_tag::TypeTag;
