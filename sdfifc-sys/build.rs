use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SDFIFC_LIB_DIR");
    println!("cargo:rerun-if-env-changed=SDFIFC_STATIC");
    println!("cargo:rustc-check-cfg=cfg(sdfifc_linked)");

    // Without the `link` feature the declarations are compiled but never
    // linked, so downstream crates can build and test against other backends.
    if env::var("CARGO_FEATURE_LINK").is_err() {
        return;
    }

    // Check if we're in a docs.rs build
    if env::var("DOCS_RS").is_ok() {
        println!("cargo:warning=Building on docs.rs - skipping libsdfifc link");
        return;
    }

    let lib_path = match try_env_dir() {
        Some(path) => Some(path),
        None => match try_pkg_config() {
            Some(path) => path,
            None => {
                println!("cargo:warning=libsdfifc not found via SDFIFC_LIB_DIR or pkg-config");
                println!("cargo:warning=Falling back to the default linker search path");
                None
            }
        },
    };

    if let Some(lib_path) = lib_path {
        println!("cargo:rustc-link-search=native={}", lib_path.display());
        println!("cargo:lib_dir={}", lib_path.display());
    }

    if env::var("SDFIFC_STATIC").map(|v| v == "1").unwrap_or(false) {
        println!("cargo:rustc-link-lib=static=sdfifc");
    } else {
        println!("cargo:rustc-link-lib=sdfifc");
    }
    println!("cargo:rustc-cfg=sdfifc_linked");
}

/// Use an explicit library directory when one is given.
fn try_env_dir() -> Option<PathBuf> {
    let dir = PathBuf::from(env::var_os("SDFIFC_LIB_DIR")?);
    if !dir.is_dir() {
        println!("cargo:warning=SDFIFC_LIB_DIR does not exist: {}", dir.display());
        return None;
    }
    println!("cargo:info=Using libsdfifc from SDFIFC_LIB_DIR");
    Some(dir)
}

/// Try to find libsdfifc using pkg-config.
///
/// Riegl does not ship a `.pc` file, but packagers commonly add one. pkg-config
/// emits its own link directives on success, so only the search path is
/// returned here.
fn try_pkg_config() -> Option<Option<PathBuf>> {
    match pkg_config::Config::new()
        .cargo_metadata(false)
        .probe("sdfifc")
    {
        Ok(lib) => {
            println!("cargo:info=Found libsdfifc via pkg-config");
            Some(lib.link_paths.first().cloned())
        }
        Err(e) => {
            println!("cargo:warning=pkg-config error: {}", e);
            None
        }
    }
}
