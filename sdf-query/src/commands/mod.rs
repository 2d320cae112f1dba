//! Command implementations, one module per output mode.

pub mod dump;
pub mod summary;
pub mod survey;
pub mod version;

#[cfg(feature = "native")]
use anyhow::Context;
use anyhow::Result;
use sdf::sdk::Sdk;

use crate::cli::{Args, Mode};

/// Run the command selected by `args` against the native library.
#[cfg(feature = "native")]
pub fn dispatch(args: &Args) -> Result<()> {
    let sdk = sdf::sdk::fwifc::Fwifc::new().context("Failed to claim libsdfifc")?;
    run_with(args, sdk)
}

/// Without the native library there is nothing to read files with.
#[cfg(not(feature = "native"))]
pub fn dispatch(_args: &Args) -> Result<()> {
    anyhow::bail!(
        "sdf-query was built without libsdfifc; rebuild with `--features native` to read .sdf files"
    )
}

/// Run the command selected by `args` against `sdk`.
#[cfg_attr(not(feature = "native"), allow(dead_code))]
pub fn run_with<S: Sdk>(args: &Args, sdk: S) -> Result<()> {
    if args.library_version {
        return version::run(&sdk);
    }

    let input = args.input().map_err(anyhow::Error::msg)?;
    match args.mode {
        Mode::Summary => summary::run(sdk, input),
        Mode::Survey => survey::run(sdk, input, &args.open_options()),
        Mode::Dump => dump::run(sdk, input, &args.open_options(), args.limit),
    }
}
