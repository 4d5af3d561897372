use std::env;
use std::fs::File;
use std::path::PathBuf;

use gl_generator::{Api, Fallbacks, GlobalGenerator, Profile, Registry};

/// Core profile bindings for OpenGL 4.6, the first version with
/// `glSpecializeShader` and `GL_SHADER_BINARY_FORMAT_SPIR_V` in core.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let mut file = File::create(out_dir.join("gl_bindings.rs"))?;
    Registry::new(Api::Gl, (4, 6), Profile::Core, Fallbacks::All, [])
        .write_bindings(GlobalGenerator, &mut file)?;
    Ok(())
}
