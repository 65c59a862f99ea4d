use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use sovran_strtree::{Codec, CodecError, Payload, Registry, StrTree, TreeError, TypeTag};
use std::io::{self, Cursor, Write};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i32,
    y: i32,
}

impl Codec for Point {
    fn marshal(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend(postcard::to_stdvec(self)?);
        Ok(())
    }

    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        *self = postcard::from_bytes(bytes)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "persistence_tests::Point"
    }
}

#[derive(Debug, Clone, Default)]
struct Tags(Vec<String>);

impl Codec for Tags {
    fn marshal(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend(postcard::to_stdvec(&self.0)?);
        Ok(())
    }

    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.0 = postcard::from_bytes(bytes)?;
        Ok(())
    }
}

fn pairs(tree: &StrTree) -> Vec<(String, Payload)> {
    tree.iter()
        .map(|value| (value.key, value.data.clone()))
        .collect()
}

#[test]
fn test_round_trip_preserves_listing() -> Result<(), TreeError> {
    let registry = Registry::new();
    let mut tree = StrTree::new();
    tree.set("cat", "meow");
    tree.set("car", "vroom");
    tree.set("cart", 42i32);

    let restored = StrTree::decode(&registry, &tree.encode(&registry)?)?;

    assert_eq!(pairs(&restored), pairs(&tree));
    assert_eq!(restored.len(), 3);
    Ok(())
}

#[test]
fn test_round_trip_preserves_types() -> Result<(), TreeError> {
    let registry = Registry::new();
    let mut tree = StrTree::new();
    tree.set("", "root");
    tree.set("bytes", vec![0u8, 255]);
    tree.set("usize", usize::MAX);
    tree.set("u8", u8::MAX);
    tree.set("u16", u16::MAX);
    tree.set("u32", u32::MAX);
    tree.set("u64", u64::MAX);
    tree.set("isize", isize::MIN);
    tree.set("i8", i8::MIN);
    tree.set("i16", i16::MIN);
    tree.set("i32", i32::MIN);
    tree.set("i64", i64::MIN);
    tree.set("f32", -0.25f32);
    tree.set("f64", f64::MAX);
    tree.set("bool", false);

    let restored = StrTree::decode(&registry, &tree.encode(&registry)?)?;

    assert_eq!(restored.get_as::<String>("")?, "root");
    assert_eq!(restored.get_as::<Vec<u8>>("bytes")?, &vec![0, 255]);
    assert_eq!(restored.get_as::<usize>("usize")?, &usize::MAX);
    assert_eq!(restored.get_as::<u8>("u8")?, &u8::MAX);
    assert_eq!(restored.get_as::<u16>("u16")?, &u16::MAX);
    assert_eq!(restored.get_as::<u32>("u32")?, &u32::MAX);
    assert_eq!(restored.get_as::<u64>("u64")?, &u64::MAX);
    assert_eq!(restored.get_as::<isize>("isize")?, &isize::MIN);
    assert_eq!(restored.get_as::<i8>("i8")?, &i8::MIN);
    assert_eq!(restored.get_as::<i16>("i16")?, &i16::MIN);
    assert_eq!(restored.get_as::<i32>("i32")?, &i32::MIN);
    assert_eq!(restored.get_as::<i64>("i64")?, &i64::MIN);
    assert_eq!(restored.get_as::<f32>("f32")?, &-0.25);
    assert_eq!(restored.get_as::<f64>("f64")?, &f64::MAX);
    assert_eq!(restored.get_as::<bool>("bool")?, &false);
    assert_eq!(pairs(&restored), pairs(&tree));
    Ok(())
}

#[test]
fn test_empty_tree_round_trip() -> Result<(), TreeError> {
    let registry = Registry::new();
    let restored = StrTree::decode(&registry, &StrTree::new().encode(&registry)?)?;
    assert!(restored.is_empty());
    assert!(restored.root().children().is_empty());
    Ok(())
}

#[test]
fn test_custom_codec_round_trip() -> Result<(), TreeError> {
    let mut registry = Registry::new();
    registry.register(Point::default())?;
    registry.register(Tags::default())?;

    let mut tree = StrTree::new();
    tree.set("origin", Payload::custom(Point { x: 0, y: 0 }));
    tree.set("target", Payload::custom(Point { x: -3, y: 7 }));
    tree.set("labels", Payload::custom(Tags(vec!["a".into(), "b".into()])));
    tree.set("count", 2u8);

    let restored = StrTree::decode(&registry, &tree.encode(&registry)?)?;

    assert_eq!(restored.get_as::<Point>("target")?, &Point { x: -3, y: 7 });
    assert_eq!(restored.get_as::<Point>("origin")?, &Point { x: 0, y: 0 });
    assert_eq!(restored.get_as::<Tags>("labels")?.0, vec!["a", "b"]);
    assert_eq!(restored.get_as::<u8>("count")?, &2);

    // Custom payloads compare by what they persist
    assert_eq!(pairs(&restored), pairs(&tree));
    Ok(())
}

#[test]
fn test_decode_uses_fresh_instances() -> Result<(), TreeError> {
    let mut registry = Registry::new();
    registry.register(Point { x: 100, y: 100 })?;

    let mut first = StrTree::new();
    first.set("p", Payload::custom(Point { x: 1, y: 2 }));
    let mut second = StrTree::new();
    second.set("p", Payload::custom(Point { x: 3, y: 4 }));

    let first = StrTree::decode(&registry, &first.encode(&registry)?)?;
    let second = StrTree::decode(&registry, &second.encode(&registry)?)?;

    assert_eq!(first.get_as::<Point>("p")?, &Point { x: 1, y: 2 });
    assert_eq!(second.get_as::<Point>("p")?, &Point { x: 3, y: 4 });
    Ok(())
}

#[test]
fn test_unknown_tag_on_decode() -> Result<(), TreeError> {
    let mut writer = Registry::new();
    writer.register(Point::default())?;

    let mut tree = StrTree::new();
    tree.set("p", Payload::custom(Point { x: 1, y: 1 }));
    let bytes = tree.encode(&writer)?;

    // A reader that never heard of Point must refuse, not guess
    let reader = Registry::new();
    match StrTree::decode(&reader, &bytes) {
        Err(TreeError::UnregisteredType(tag)) => {
            assert_eq!(tag, TypeTag::from_name("persistence_tests::Point"));
        }
        other => panic!("expected UnregisteredType, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_unregistered_custom_type_on_encode() {
    let mut tree = StrTree::new();
    tree.set("p", Payload::custom(Point { x: 1, y: 1 }));

    assert!(matches!(
        tree.encode(&Registry::new()),
        Err(TreeError::UnregisteredType(_))
    ));
}

#[test]
fn test_empty_registry_cannot_encode_primitives() {
    let mut tree = StrTree::new();
    tree.set("n", 1u8);

    assert!(matches!(
        tree.encode(&Registry::empty()),
        Err(TreeError::UnregisteredType(tag)) if tag == TypeTag::of::<u8>()
    ));

    // An empty tree has no payloads to resolve
    assert!(StrTree::new().encode(&Registry::empty()).is_ok());
}

#[test]
fn test_write_to_and_read_from() -> Result<(), TreeError> {
    let registry = Registry::new();
    let mut tree = StrTree::new();
    tree.set("alpha", 1u8);
    tree.set("beta", "two");

    let mut sink = Vec::new();
    tree.write_to(&registry, &mut sink)?;
    assert_eq!(sink, tree.encode(&registry)?);

    let restored = StrTree::read_from(&registry, Cursor::new(sink))?;
    assert_eq!(pairs(&restored), pairs(&tree));
    Ok(())
}

struct BrokenWriter;

impl Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_io_errors_propagate() {
    let registry = Registry::new();
    let mut tree = StrTree::new();
    tree.set("k", 1u8);

    assert!(matches!(
        tree.write_to(&registry, BrokenWriter),
        Err(TreeError::Io(_))
    ));
}

#[test]
fn test_garbage_is_malformed() {
    let registry = Registry::new();
    assert!(matches!(
        StrTree::decode(&registry, &[]),
        Err(TreeError::MalformedStream { .. })
    ));
    assert!(matches!(
        StrTree::decode(&registry, b"not a tree"),
        Err(TreeError::MalformedStream { .. })
    ));
}

#[test]
fn test_corrupt_custom_payload_is_malformed() -> Result<(), TreeError> {
    let mut registry = Registry::new();
    registry.register(Point::default())?;

    let mut tree = StrTree::new();
    tree.set("p", Payload::custom(Point { x: 1, y: 1 }));
    let mut bytes = tree.encode(&registry)?;

    // Shrink the payload length prefix so the point no longer fits
    let tag = TypeTag::from_name("persistence_tests::Point");
    let at = bytes
        .windows(TypeTag::LEN)
        .position(|window| window == tag.as_bytes())
        .expect("tag present")
        + TypeTag::LEN;
    let len = bytes[at] as usize;
    bytes.remove(at + len);
    bytes[at] -= 1;

    assert!(matches!(
        StrTree::decode(&registry, &bytes),
        Err(TreeError::MalformedStream { .. })
    ));
    Ok(())
}

#[test]
fn test_long_key_round_trip() -> Result<(), TreeError> {
    let registry = Registry::new();
    let key: String = "xyz".repeat(10_000);

    let mut tree = StrTree::new();
    tree.set(&key, 9u8);
    tree.set(&key[..3], 3u8);

    let restored = StrTree::decode(&registry, &tree.encode(&registry)?)?;
    assert_eq!(restored.get_as::<u8>(&key)?, &9);
    assert_eq!(restored.get_as::<u8>("xyz")?, &3);
    assert_eq!(restored.len(), 2);
    Ok(())
}

fn primitive() -> impl Strategy<Value = Payload> {
    prop_oneof![
        ".{0,8}".prop_map(Payload::from),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Payload::from),
        any::<u16>().prop_map(Payload::from),
        any::<u64>().prop_map(Payload::from),
        any::<i32>().prop_map(Payload::from),
        any::<i64>().prop_map(Payload::from),
        any::<bool>().prop_map(Payload::from),
        (-1.0e6f64..1.0e6).prop_map(Payload::from),
    ]
}

proptest! {
    #[test]
    fn prop_round_trip(entries in prop::collection::vec((".{0,5}", primitive()), 0..30)) {
        let registry = Registry::new();
        let mut tree = StrTree::new();
        for (key, value) in entries {
            tree.set(&key, value);
        }

        let bytes = tree.encode(&registry).unwrap();
        let restored = StrTree::decode(&registry, &bytes).unwrap();
        prop_assert_eq!(pairs(&restored), pairs(&tree));
        prop_assert_eq!(restored.len(), tree.len());
    }
}
