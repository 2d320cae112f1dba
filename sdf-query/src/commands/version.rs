//! Library version (--library-version).

use anyhow::{Context, Result};

use sdf::sdk::Sdk;
use sdf::LibraryVersion;

/// Run the version command.
pub fn run<S: Sdk>(sdk: &S) -> Result<()> {
    let version = LibraryVersion::query(sdk).context("Failed to get library version")?;
    println!("     sdf-query version: {}", env!("CARGO_PKG_VERSION"));
    println!("    sdfifc api version: {}.{}", version.api_major, version.api_minor);
    println!("  sdfifc build version: {}", version.build_version);
    println!("      sdfifc build tag: {}", version.build_tag);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdf::sdk::memory::{Fixture, MemorySdk};

    #[test]
    fn test_version_of_memory_backend() {
        run(&MemorySdk::new(Fixture::default())).unwrap();
    }
}
