//! Build script for dlr-rs.
//!
//! With the `dlr` feature enabled, emits link directives for the prebuilt
//! native DLR runtime library. Nothing is compiled here; the runtime ships
//! as a shared library.
//!
//! # Environment Variables
//!
//! - `DLR_HOME`: Path to a DLR installation; the library is expected under
//!   `$DLR_HOME/lib`.
//! - `DLR_LIB_DIR`: Directory containing `libdlr` directly. Takes precedence
//!   over `DLR_HOME`.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=DLR_HOME");
    println!("cargo:rerun-if-env-changed=DLR_LIB_DIR");

    // Only link the native runtime when the FFI backend is compiled in.
    if env::var_os("CARGO_FEATURE_DLR").is_none() {
        return;
    }

    let lib_dir = env::var("DLR_LIB_DIR")
        .map(PathBuf::from)
        .or_else(|_| env::var("DLR_HOME").map(|home| PathBuf::from(home).join("lib")));

    match lib_dir {
        Ok(lib_dir) => {
            if !lib_dir.exists() {
                panic!(
                    "DLR library directory does not exist: {}\n\
                     Set DLR_HOME to your DLR installation or DLR_LIB_DIR to the \
                     directory containing libdlr.",
                    lib_dir.display()
                );
            }
            println!("cargo:rustc-link-search=native={}", lib_dir.display());

            // Use RPATH so the binary finds libdlr without LD_LIBRARY_PATH
            println!("cargo:rustc-link-arg=-Wl,-rpath,{}", lib_dir.display());
        }
        Err(_) => {
            // Fall through to the system linker search path.
            println!(
                "cargo:warning=Neither DLR_LIB_DIR nor DLR_HOME is set; \
                 relying on the system library path for libdlr"
            );
        }
    }

    println!("cargo:rustc-link-lib=dylib=dlr");
}
