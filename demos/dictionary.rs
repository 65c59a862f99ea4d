use sovran_strtree::{Registry, StrTree, TreeError};
use std::fs::File;
use std::io::{BufReader, BufWriter};

/// Demonstrates building a small dictionary, saving it to disk and loading it back
fn main() -> Result<(), TreeError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let registry = Registry::new();

    // Words sharing prefixes share nodes
    let mut dictionary: StrTree = [
        ("car", "a road vehicle"),
        ("card", "a piece of stiff paper"),
        ("care", "serious attention"),
        ("cart", "a wheeled container"),
        ("cat", "a small feline"),
    ]
    .into_iter()
    .collect();

    // Counters live next to definitions
    dictionary.set("stats/lookups", 0u64);
    dictionary.set("stats/ready", true);

    for word in ["cart", "ca", "cattle"] {
        match dictionary.get(word) {
            Ok(definition) => println!("{}: {}", word, definition),
            Err(TreeError::NotFound(key)) => println!("{}: not in dictionary", key),
            Err(e) => return Err(e),
        }
        if let Some(lookups) = dictionary.get_mut("stats/lookups")?.downcast_mut::<u64>() {
            *lookups += 1;
        }
    }

    let path = std::env::temp_dir().join("sovran-strtree-dictionary.bin");
    dictionary.write_to(&registry, BufWriter::new(File::create(&path)?))?;
    println!("Saved {} entries to {}", dictionary.len(), path.display());

    let loaded = StrTree::read_from(&registry, BufReader::new(File::open(&path)?))?;
    println!("Loaded: {}", loaded);
    println!("Lookups so far: {}", loaded.get_as::<u64>("stats/lookups")?);

    std::fs::remove_file(&path)?;
    Ok(())
}
