//! The slice of the OpenGL API this crate talks to.
//!
//! Everything above this module goes through [`GlApi`] instead of calling the
//! `gl` crate directly:
//! - `native` forwards each call to the function pointers loaded from the
//!   current context.
//! - `fake` (tests only) tracks object lifetimes, attachments and the bound
//!   program so resource leaks and double deletes show up as assertion
//!   failures instead of driver warnings.
//!
//! Object names are raw `GLuint`s; `0` is the null sentinel everywhere.

mod native;

#[cfg(test)]
pub(crate) mod fake;

pub use native::NativeGl;

use crate::types::ShaderStage;

/// Raw OpenGL object name.
pub type GlName = u32;

/// Entry point every shader must expose when loaded from SPIR-V.
pub const SPIRV_ENTRY_POINT: &str = "main";

/// OpenGL calls used by the shader manager, the scene and the runtime.
///
/// Implementations assume the owning context is current on the calling
/// thread. Creation calls return `0` when the driver refuses to allocate.
pub trait GlApi {
    fn create_shader(&self, stage: ShaderStage) -> GlName;
    fn shader_source(&self, shader: GlName, source: &str);
    fn compile_shader(&self, shader: GlName);
    /// Loads a SPIR-V module into `shader` (`GL_SHADER_BINARY_FORMAT_SPIR_V`).
    fn shader_binary_spirv(&self, shader: GlName, binary: &[u8]);
    /// Specialises a SPIR-V shader without specialisation constants.
    fn specialize_shader(&self, shader: GlName, entry_point: &str);
    fn shader_compile_status(&self, shader: GlName) -> bool;
    fn shader_info_log(&self, shader: GlName) -> String;
    fn delete_shader(&self, shader: GlName);

    fn create_program(&self) -> GlName;
    fn attach_shader(&self, program: GlName, shader: GlName);
    fn detach_shader(&self, program: GlName, shader: GlName);
    fn link_program(&self, program: GlName);
    fn program_link_status(&self, program: GlName) -> bool;
    fn program_info_log(&self, program: GlName) -> String;
    fn use_program(&self, program: GlName);
    fn delete_program(&self, program: GlName);
    /// Column-major 4x4 matrix upload to an explicit uniform location.
    fn program_uniform_mat4(&self, program: GlName, location: i32, columns: &[f32; 16]);

    fn create_buffer(&self) -> GlName;
    /// Replaces the contents of an array buffer (`GL_STATIC_DRAW`).
    fn buffer_data(&self, buffer: GlName, data: &[u8]);
    fn delete_buffer(&self, buffer: GlName);

    fn create_vertex_array(&self) -> GlName;
    fn bind_vertex_array(&self, vertex_array: GlName);
    fn delete_vertex_array(&self, vertex_array: GlName);

    fn enable_vertex_attrib(&self, index: u32);
    fn disable_vertex_attrib(&self, index: u32);
    /// Points attribute `index` at tightly packed `f32` components in `buffer`.
    fn vertex_attrib_f32(&self, index: u32, buffer: GlName, components: i32);

    fn enable(&self, capability: u32);
    fn viewport(&self, width: i32, height: i32);
    fn clear_color(&self, rgba: [f32; 4]);
    /// Clears colour and depth.
    fn clear(&self);
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
    /// Pops the oldest recorded error flag, `GL_NO_ERROR` when none is pending.
    fn error(&self) -> u32;
}
