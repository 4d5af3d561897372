use crate::glapi::{GlApi, SPIRV_ENTRY_POINT};
use crate::handle::ShaderHandle;
use crate::program::ShaderError;
use crate::types::{ShaderPayload, ShaderSource};

/// Creates and compiles one shader object.
///
/// The returned handle deletes the object on drop, so an early return on a
/// failed compile leaves nothing behind.
pub(crate) fn compile_shader<G>(
    gl: &G,
    source: &ShaderSource<'_>,
) -> Result<ShaderHandle<G>, ShaderError>
where
    G: GlApi + Clone,
{
    let stage = source.stage;
    let shader = ShaderHandle::new(gl.clone(), gl.create_shader(stage));
    if shader.is_null() {
        return Err(ShaderError::Compile {
            stage,
            log: "driver did not allocate a shader object".to_string(),
        });
    }

    match &source.payload {
        ShaderPayload::Glsl(text) => {
            gl.shader_source(shader.name(), text);
            gl.compile_shader(shader.name());
        }
        ShaderPayload::SpirV(binary) => {
            gl.shader_binary_spirv(shader.name(), binary);
            gl.specialize_shader(shader.name(), SPIRV_ENTRY_POINT);
        }
    }

    if !gl.shader_compile_status(shader.name()) {
        let log = clean_log(gl.shader_info_log(shader.name()));
        return Err(ShaderError::Compile { stage, log });
    }

    tracing::debug!(%stage, shader = shader.name(), "compiled shader stage");
    Ok(shader)
}

/// Drivers report logs with trailing NULs and newlines.
pub(crate) fn clean_log(log: String) -> String {
    let trimmed = log.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.len() == log.len() {
        log
    } else {
        trimmed.to_string()
    }
}
