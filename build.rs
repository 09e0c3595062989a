//! Records the target triple and the profile of the build. Together with the
//! Git information collected by `shadow-rs` this lets the binary report how
//! exactly it was built.

use std::path::PathBuf;
use std::{env, fs};

fn main() -> shadow_rs::SdResult<()> {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("cargo always sets OUT_DIR"));
    let target = env::var("TARGET").unwrap_or_default();
    let profile = env::var("PROFILE").unwrap_or_default();
    fs::write(out_dir.join("target"), format!("{target} ({profile})"))
        .expect("OUT_DIR is writable");
    shadow_rs::new()
}
