//! Vendor library identification.

use std::fmt;

use crate::error::Result;
use crate::sdk::Sdk;
use crate::status;

/// Version information of the vendor library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryVersion {
    /// API major version.
    pub api_major: u16,
    /// API minor version.
    pub api_minor: u16,
    /// Build version string.
    pub build_version: String,
    /// Build tag string.
    pub build_tag: String,
}

impl LibraryVersion {
    /// Ask `sdk` which library it is.
    pub fn query<S: Sdk>(sdk: &S) -> Result<LibraryVersion> {
        let raw = sdk
            .library_version()
            .map_err(|code| status::from_sdk(sdk, code).into_error("reading the library version"))?;
        Ok(LibraryVersion {
            api_major: raw.api_major,
            api_minor: raw.api_minor,
            build_version: raw.build_version,
            build_tag: raw.build_tag,
        })
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} (build {}, tag {})",
            self.api_major, self.api_minor, self.build_version, self.build_tag
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::memory::{Fixture, MemorySdk};

    #[test]
    fn test_query_memory() {
        let version = LibraryVersion::query(&MemorySdk::new(Fixture::default())).unwrap();
        assert_eq!(version.api_major, 1);
        assert_eq!(version.to_string(), "1.0 (build memory, tag fixture)");
    }
}
