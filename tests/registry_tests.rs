use sovran_strtree::{
    Codec, CodecError, NativeCodec, Payload, Registry, StrCodec, StrTree, TreeError, TypeTag,
    U8Codec,
};

#[derive(Debug, Clone, Default)]
struct Note(String);

impl Codec for Note {
    fn marshal(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend_from_slice(self.0.as_bytes());
        Ok(())
    }

    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.0 = String::from_utf8(bytes.to_vec())
            .map_err(|e| CodecError::Custom(e.to_string()))?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "registry_tests::Note"
    }
}

// Claims whatever tag it is told to, to exercise collision handling
#[derive(Debug, Clone)]
struct Impostor(TypeTag);

impl Codec for Impostor {
    fn marshal(&self, _out: &mut Vec<u8>) -> Result<(), CodecError> {
        Ok(())
    }

    fn unmarshal(&mut self, _bytes: &[u8]) -> Result<(), CodecError> {
        Ok(())
    }

    fn type_tag(&self) -> TypeTag {
        self.0
    }
}

// Borrows the name of the u8 wrapper without being one
#[derive(Debug, Clone, Default)]
struct FakeByte(Vec<u8>);

impl Codec for FakeByte {
    fn marshal(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend_from_slice(&self.0);
        Ok(())
    }

    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.0 = bytes.to_vec();
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "sovran_strtree::codec::U8Codec"
    }
}

#[test]
fn test_builtin_wrappers() {
    let registry = Registry::new();
    assert_eq!(registry.len(), 15);
    assert!(!registry.is_empty());

    let naturals = [
        TypeTag::of::<String>(),
        TypeTag::of::<Vec<u8>>(),
        TypeTag::of::<usize>(),
        TypeTag::of::<u8>(),
        TypeTag::of::<u16>(),
        TypeTag::of::<u32>(),
        TypeTag::of::<u64>(),
        TypeTag::of::<isize>(),
        TypeTag::of::<i8>(),
        TypeTag::of::<i16>(),
        TypeTag::of::<i32>(),
        TypeTag::of::<i64>(),
        TypeTag::of::<f32>(),
        TypeTag::of::<f64>(),
        TypeTag::of::<bool>(),
    ];
    for natural in naturals {
        let wrapper = registry.wrapper_for(natural).expect("every primitive has a wrapper");
        assert!(registry.contains(wrapper));
        assert_ne!(wrapper, natural);
    }

    let u8_wrapper = registry.wrapper_for(TypeTag::of::<u8>()).unwrap();
    assert_eq!(u8_wrapper, TypeTag::from_name("sovran_strtree::codec::U8Codec"));
    assert_eq!(registry.name_of(u8_wrapper), Some("sovran_strtree::codec::U8Codec"));
}

#[test]
fn test_empty_registry() {
    let registry = Registry::empty();
    assert!(registry.is_empty());
    assert_eq!(registry.wrapper_for(TypeTag::of::<u8>()), None);
    assert!(registry.tags().is_empty());
}

#[test]
fn test_register_returns_tag() -> Result<(), TreeError> {
    let mut registry = Registry::new();
    let tag = registry.register(Note::default())?;

    assert_eq!(tag, TypeTag::from_name("registry_tests::Note"));
    assert!(registry.contains(tag));
    assert_eq!(registry.len(), 16);
    assert_eq!(registry.name_of(tag), Some("registry_tests::Note"));

    // Registering again replaces rather than duplicates
    registry.register(Note("prototype".to_string()))?;
    assert_eq!(registry.len(), 16);
    Ok(())
}

#[test]
fn test_register_rejects_absent_tag() {
    let mut registry = Registry::new();
    let result = registry.register(Impostor(TypeTag::ABSENT));
    assert!(matches!(result, Err(TreeError::InvalidRegistration(_))));
    assert_eq!(registry.len(), 15);
}

#[test]
fn test_register_rejects_collisions() -> Result<(), TreeError> {
    let mut registry = Registry::new();
    let note = registry.register(Note::default())?;

    match registry.register(Impostor(note)) {
        Err(TreeError::InvalidRegistration(reason)) => {
            assert!(reason.contains("registry_tests::Note"));
        }
        other => panic!("expected InvalidRegistration, got {:?}", other),
    }

    // A wrapper tag can't be taken over either
    let wrapper = registry.wrapper_for(TypeTag::of::<String>()).unwrap();
    assert!(registry.register(Impostor(wrapper)).is_err());

    // The original registrations still work
    let mut tree = StrTree::new();
    tree.set("n", Payload::custom(Note("hi".to_string())));
    tree.set("s", "text");
    let restored = StrTree::decode(&registry, &tree.encode(&registry)?)?;
    assert_eq!(restored.get_as::<Note>("n")?.0, "hi");
    assert_eq!(restored.get_as::<String>("s")?, "text");
    Ok(())
}

#[test]
fn test_registering_builtin_wrapper_is_noop() -> Result<(), TreeError> {
    let mut registry = Registry::new();
    let tag = registry.register(StrCodec::default())?;

    assert_eq!(Some(tag), registry.wrapper_for(TypeTag::of::<String>()));
    assert_eq!(registry.len(), 15);

    let mut tree = StrTree::new();
    tree.set("s", "still a wrapper");
    let restored = StrTree::decode(&registry, &tree.encode(&registry)?)?;
    assert_eq!(restored.get("s")?, &Payload::from("still a wrapper"));
    Ok(())
}

#[test]
fn test_register_rejects_wrapper_name_on_other_type() -> Result<(), TreeError> {
    let mut registry = Registry::new();
    let wrapper = registry.wrapper_for(TypeTag::of::<u8>()).unwrap();

    match registry.register(FakeByte::default()) {
        Err(TreeError::InvalidRegistration(reason)) => {
            assert!(reason.contains("U8Codec"));
        }
        other => panic!("expected InvalidRegistration, got {:?}", other),
    }
    assert_eq!(registry.len(), 15);

    // Bare u8 values still go through the wrapper
    let mut tree = StrTree::new();
    tree.set("byte", 7u8);
    let restored = StrTree::decode(&registry, &tree.encode(&registry)?)?;
    assert_eq!(restored.get_as::<u8>("byte")?, &7);

    // The same type under its own name still registers
    assert_eq!(registry.register(U8Codec::default())?, wrapper);
    assert_eq!(registry.wrapper_for(TypeTag::of::<u8>()), Some(wrapper));
    Ok(())
}

#[test]
fn test_register_rejects_name_reused_by_other_type() -> Result<(), TreeError> {
    #[derive(Debug, Clone, Default)]
    struct OtherNote;

    impl Codec for OtherNote {
        fn marshal(&self, _out: &mut Vec<u8>) -> Result<(), CodecError> {
            Ok(())
        }

        fn unmarshal(&mut self, _bytes: &[u8]) -> Result<(), CodecError> {
            Ok(())
        }

        fn type_name(&self) -> &'static str {
            "registry_tests::Note"
        }
    }

    let mut registry = Registry::new();
    let tag = registry.register(Note::default())?;
    assert!(matches!(
        registry.register(OtherNote),
        Err(TreeError::InvalidRegistration(_))
    ));

    // Re-registering the original type replaces its prototype
    assert_eq!(registry.register(Note("again".to_string()))?, tag);
    assert_eq!(registry.len(), 16);
    Ok(())
}

#[test]
fn test_tags_are_sorted() -> Result<(), TreeError> {
    let mut registry = Registry::new();
    registry.register(Note::default())?;

    let tags = registry.tags();
    assert_eq!(tags.len(), 16);
    assert!(tags.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(format!("{:?}", registry).contains("registry_tests::Note"));
    Ok(())
}

#[test]
fn test_native_codec_checks_kind() -> Result<(), CodecError> {
    let mut codec = U8Codec::default();

    match codec.set(&Payload::from("x")) {
        Err(CodecError::WrongKind { expected, found }) => {
            assert_eq!(expected, "u8");
            assert_eq!(found, "string");
        }
        other => panic!("expected WrongKind, got {:?}", other),
    }

    codec.set(&Payload::U8(5))?;
    assert_eq!(codec.get(), Payload::U8(5));

    let mut out = Vec::new();
    codec.marshal(&mut out)?;
    assert_eq!(out, vec![5]);

    let mut other = U8Codec::default();
    other.unmarshal(&out)?;
    assert_eq!(other.get(), Payload::U8(5));

    // Trailing bytes mean the payload was misframed
    assert!(other.unmarshal(&[5, 6]).is_err());
    Ok(())
}

#[test]
fn test_error_display() {
    assert_eq!(
        TreeError::NotFound("k".to_string()).to_string(),
        "Key not found in tree: \"k\""
    );
    assert_eq!(
        TreeError::TypeMismatch.to_string(),
        "Type mismatch for the requested key"
    );

    let tag = TypeTag::from_bytes([1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(
        TreeError::UnregisteredType(tag).to_string(),
        "No codec registered for type tag 0102030405060708"
    );

    let err = TreeError::MalformedStream {
        offset: 3,
        reason: "bad".to_string(),
    };
    assert_eq!(err.to_string(), "Malformed stream at byte 3: bad");
}
