//! Generate `lumi.h` from the `extern "C"` surface.
//!
//! The header is written to `OUT_DIR`. Set `LUMI_FFI_HEADER_DIR` to also
//! place a copy in a directory of your choosing.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");
    println!("cargo:rerun-if-env-changed=LUMI_FFI_HEADER_DIR");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()));
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap_or_else(|_| ".".into()));

    let bindings = match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("LUMI_H")
        .with_documentation(true)
        .generate()
    {
        Ok(bindings) => bindings,
        Err(err) => {
            println!("cargo:warning=cbindgen failed: {err}");
            return;
        }
    };

    bindings.write_to_file(out_dir.join("lumi.h"));
    if let Some(dir) = env::var_os("LUMI_FFI_HEADER_DIR") {
        bindings.write_to_file(PathBuf::from(dir).join("lumi.h"));
    }
}
