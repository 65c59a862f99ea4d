use serde::{Deserialize, Serialize};
use sovran_strtree::{Codec, CodecError, Payload, Registry, StrTree, TreeError};

// Example types: animals that know how to persist themselves
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Dog {
    name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Cat {
    name: String,
    lives: u8,
}

impl Codec for Dog {
    fn marshal(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend(postcard::to_stdvec(self)?);
        Ok(())
    }

    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        *self = postcard::from_bytes(bytes)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "demo::Dog"
    }
}

impl Codec for Cat {
    fn marshal(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend(postcard::to_stdvec(self)?);
        Ok(())
    }

    fn unmarshal(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        *self = postcard::from_bytes(bytes)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "demo::Cat"
    }
}

fn main() -> Result<(), TreeError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Both animal types must be known before a tree holding them is decoded
    let mut registry = Registry::new();
    registry.register(Dog::default())?;
    registry.register(Cat::default())?;

    let mut pets = StrTree::new();
    pets.set(
        "pets/dog1",
        Payload::custom(Dog {
            name: "Rover".to_string(),
        }),
    );
    pets.set(
        "pets/cat1",
        Payload::custom(Cat {
            name: "Whiskers".to_string(),
            lives: 9,
        }),
    );
    pets.set("pets/count", 2u32);

    let bytes = pets.encode(&registry)?;
    println!("Encoded {} entries into {} bytes", pets.len(), bytes.len());

    let restored = StrTree::decode(&registry, &bytes)?;
    for entry in &restored {
        println!("{}", entry);
    }

    // Access by concrete type
    match restored.get_as::<Cat>("pets/cat1") {
        Ok(cat) => println!("Cat named {} has {} lives", cat.name, cat.lives),
        Err(TreeError::NotFound(key)) => println!("{} not found in tree", key),
        Err(TreeError::TypeMismatch) => println!("Value is not a Cat"),
        Err(e) => println!("Unexpected error: {}", e),
    }

    // Attempting to access with incorrect type (intentional error)
    match restored.get_as::<Cat>("pets/dog1") {
        Ok(_) => println!("This shouldn't happen"),
        Err(TreeError::TypeMismatch) => println!("Correctly detected type mismatch"),
        Err(e) => println!("Unexpected error: {}", e),
    }

    // A registry that only knows the primitives refuses the stream
    match StrTree::decode(&Registry::new(), &bytes) {
        Ok(_) => println!("This shouldn't happen"),
        Err(TreeError::UnregisteredType(tag)) => println!("Unknown payload type {}", tag),
        Err(e) => println!("Unexpected error: {}", e),
    }

    Ok(())
}
