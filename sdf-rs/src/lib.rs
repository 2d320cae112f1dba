//! # sdf-rs
//!
//! Safe, idiomatic Rust access to Riegl full-waveform `.sdf` files through
//! the vendor's `libsdfifc`.
//!
//! An `.sdf` file is a stream of laser pulses, each carrying the digitized
//! waveform of its echo. The vendor library hands out opaque handles, numeric
//! status codes and sample buffers it reuses on every read. This crate turns
//! that into owned records, typed errors, and handles that are released
//! exactly once.
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "native")]
//! # fn main() -> sdf::Result<()> {
//! let mut file = sdf::open("110630_174316.sdf")?;
//! println!("{} pulses", file.metadata().pulse_count);
//!
//! let mut lines = file.scan_lines()?;
//! while let Some(line) = lines.try_next()? {
//!     for pulse in lines.pulses()? {
//!         let pulse = pulse?;
//!         println!(
//!             "scan line {} pulse {}: {} samples",
//!             line.index,
//!             pulse.index,
//!             pulse.waveform.sample_count()
//!         );
//!     }
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "native"))]
//! # fn main() {}
//! ```
//!
//! Whole-file operations live in [`query`].
//!
//! ## Backends
//!
//! Everything is generic over [`sdk::Sdk`], the raw vendor boundary:
//!
//! - [`sdk::fwifc::Fwifc`] calls `libsdfifc` (feature `native`)
//! - `sdk::memory::MemorySdk` serves in-memory fixtures, for tests (feature
//!   `testing`)
//!
//! ## Feature Flags
//!
//! - `native`: Link `libsdfifc` and enable the native backend
//! - `testing`: Enable the in-memory backend
//!
//! ## Thread Safety
//!
//! The vendor library is not thread-safe. [`SdfFile`] and everything borrowed
//! from it are `!Send + !Sync`. The native backend also pins `libsdfifc` to
//! one thread at a time: [`sdk::fwifc::Fwifc::new`] fails with
//! [`Error::InvalidState`] while another thread holds a `Fwifc`.

#![deny(missing_docs)]

// Modules
mod calibration;
mod cursor;
mod error;
mod file;
mod handle;
mod pulse;
pub mod query;
mod scan_line;
pub mod sdk;
mod status;
mod version;
mod waveform;

// Public exports
pub use calibration::{Calibration, CalibrationKind, CalibrationTable};
pub use error::{Error, Result};
pub use file::{Metadata, OpenOptions, SdfFile, SosblMode, SUPPORTED_FORMAT_VERSION};
pub use pulse::{Pulse, Pulses};
pub use scan_line::{ScanLine, ScanLines};
pub use version::LibraryVersion;
pub use waveform::{Channel, SampleBlock, Waveform};

/// Open a file with the native backend.
#[cfg(feature = "native")]
pub fn open(path: impl AsRef<std::path::Path>) -> Result<SdfFile<sdk::fwifc::Fwifc>> {
    SdfFile::open(sdk::fwifc::Fwifc::new()?, path)
}

/// Version information of the linked `libsdfifc`.
#[cfg(feature = "native")]
pub fn library_version() -> Result<LibraryVersion> {
    LibraryVersion::query(&sdk::fwifc::Fwifc::new()?)
}
