//! The vertex and fragment stages bundled with the demo.
//!
//! SPIR-V builds embed the modules `build.rs` produced; GLSL builds read the
//! sources at startup from `VITORE_SHADER_DIR` or the crate's `shaders/`
//! directory.

use std::path::PathBuf;

use renderer::{ShaderError, ShaderSource, ShaderStage};

/// Overrides where GLSL sources are read from.
#[cfg_attr(feature = "spirv", allow(dead_code))]
pub const SHADER_DIR_ENV: &str = "VITORE_SHADER_DIR";

#[cfg_attr(feature = "spirv", allow(dead_code))]
pub const VERTEX_FILE: &str = "shader.vert";
#[cfg_attr(feature = "spirv", allow(dead_code))]
pub const FRAGMENT_FILE: &str = "shader.frag";

#[cfg(feature = "spirv")]
static VERTEX_SPIRV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/shader.vert.spv"));
#[cfg(feature = "spirv")]
static FRAGMENT_SPIRV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/shader.frag.spv"));

/// Returns the stages in attachment order: vertex, then fragment.
#[cfg(feature = "spirv")]
pub fn bundled_shaders() -> Result<Vec<ShaderSource<'static>>, ShaderError> {
    tracing::debug!("using embedded SPIR-V modules");
    Ok(vec![
        ShaderSource::spirv(ShaderStage::Vertex, VERTEX_SPIRV),
        ShaderSource::spirv(ShaderStage::Fragment, FRAGMENT_SPIRV),
    ])
}

/// Returns the stages in attachment order: vertex, then fragment.
#[cfg(not(feature = "spirv"))]
pub fn bundled_shaders() -> Result<Vec<ShaderSource<'static>>, ShaderError> {
    let dir = shader_dir();
    tracing::debug!(dir = %dir.display(), "loading GLSL shader sources");
    glsl_shaders_in(&dir)
}

#[cfg_attr(feature = "spirv", allow(dead_code))]
pub fn shader_dir() -> PathBuf {
    std::env::var_os(SHADER_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders"))
}

#[cfg_attr(feature = "spirv", allow(dead_code))]
pub fn glsl_shaders_in(dir: &std::path::Path) -> Result<Vec<ShaderSource<'static>>, ShaderError> {
    Ok(vec![
        ShaderSource::glsl_file(ShaderStage::Vertex, dir.join(VERTEX_FILE))?,
        ShaderSource::glsl_file(ShaderStage::Fragment, dir.join(FRAGMENT_FILE))?,
    ])
}
