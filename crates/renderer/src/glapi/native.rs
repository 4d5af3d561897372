use std::ffi::{c_void, CStr, CString};
use std::marker::PhantomData;
use std::ptr;

use super::{GlApi, GlName};
use crate::debug;
use crate::gl;
use crate::gl::types::{GLchar, GLint, GLsizei, GLsizeiptr, GLuint};
use crate::types::ShaderStage;

/// [`GlApi`] backed by the process-wide function pointers of the `gl` crate.
///
/// The value is a token proving [`NativeGl::load`] ran against a context that
/// is current on this thread. It is neither `Send` nor `Sync`.
#[derive(Clone, Copy, Debug)]
pub struct NativeGl {
    _current_context: PhantomData<*const ()>,
}

impl NativeGl {
    /// Resolves every GL entry point through `loader`.
    ///
    /// # Safety
    ///
    /// The context the loader belongs to must be current on the calling
    /// thread for as long as the returned value (or any handle holding a
    /// copy of it) is used.
    pub unsafe fn load<F>(mut loader: F) -> Self
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        gl::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => loader(&symbol),
            Err(_) => ptr::null(),
        });
        Self {
            _current_context: PhantomData,
        }
    }

    /// True when the GL 4.6 SPIR-V entry points resolved.
    pub fn supports_spirv(&self) -> bool {
        gl::ShaderBinary::is_loaded() && gl::SpecializeShader::is_loaded()
    }

    /// Routes driver debug messages into `tracing`.
    pub fn install_debug_callback(&self) {
        if !gl::DebugMessageCallback::is_loaded() {
            tracing::warn!("glDebugMessageCallback unavailable; driver diagnostics disabled");
            return;
        }
        unsafe {
            gl::Enable(gl::DEBUG_OUTPUT);
            gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
            gl::DebugMessageCallback(Some(debug::gl_debug_callback), ptr::null());
        }
    }

    /// Reads a driver string such as `GL_VERSION` or `GL_RENDERER`.
    pub fn string(&self, name: u32) -> Option<String> {
        let raw = unsafe { gl::GetString(name) };
        if raw.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(raw.cast()) };
        Some(text.to_string_lossy().into_owned())
    }
}

fn gl_len(len: usize) -> GLsizei {
    GLsizei::try_from(len).unwrap_or(GLsizei::MAX)
}

fn read_info_log(length: GLint, fetch: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar)) -> String {
    if length <= 0 {
        return String::new();
    }
    let mut buffer = vec![0u8; length as usize];
    let mut written: GLsizei = 0;
    fetch(length, &mut written, buffer.as_mut_ptr().cast());
    buffer.truncate(written.clamp(0, length) as usize);
    String::from_utf8_lossy(&buffer).into_owned()
}

impl GlApi for NativeGl {
    fn create_shader(&self, stage: ShaderStage) -> GlName {
        unsafe { gl::CreateShader(stage.gl_enum()) }
    }

    fn shader_source(&self, shader: GlName, source: &str) {
        let text: *const GLchar = source.as_ptr().cast();
        let length: GLint = gl_len(source.len());
        unsafe { gl::ShaderSource(shader, 1, &text, &length) }
    }

    fn compile_shader(&self, shader: GlName) {
        unsafe { gl::CompileShader(shader) }
    }

    fn shader_binary_spirv(&self, shader: GlName, binary: &[u8]) {
        unsafe {
            gl::ShaderBinary(
                1,
                &shader,
                gl::SHADER_BINARY_FORMAT_SPIR_V,
                binary.as_ptr().cast(),
                gl_len(binary.len()),
            )
        }
    }

    fn specialize_shader(&self, shader: GlName, entry_point: &str) {
        let Ok(entry_point) = CString::new(entry_point) else {
            tracing::error!(shader, "entry point contains an interior NUL; skipping specialisation");
            return;
        };
        unsafe {
            gl::SpecializeShader(shader, entry_point.as_ptr(), 0, ptr::null(), ptr::null());
        }
    }

    fn shader_compile_status(&self, shader: GlName) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status) };
        status != GLint::from(gl::FALSE)
    }

    fn shader_info_log(&self, shader: GlName) -> String {
        let mut length: GLint = 0;
        unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut length) };
        read_info_log(length, |capacity, written, buffer| unsafe {
            gl::GetShaderInfoLog(shader, capacity, written, buffer)
        })
    }

    fn delete_shader(&self, shader: GlName) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> GlName {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GlName, shader: GlName) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&self, program: GlName, shader: GlName) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&self, program: GlName) {
        unsafe { gl::LinkProgram(program) }
    }

    fn program_link_status(&self, program: GlName) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut status) };
        status != GLint::from(gl::FALSE)
    }

    fn program_info_log(&self, program: GlName) -> String {
        let mut length: GLint = 0;
        unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut length) };
        read_info_log(length, |capacity, written, buffer| unsafe {
            gl::GetProgramInfoLog(program, capacity, written, buffer)
        })
    }

    fn use_program(&self, program: GlName) {
        unsafe { gl::UseProgram(program) }
    }

    fn delete_program(&self, program: GlName) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn program_uniform_mat4(&self, program: GlName, location: i32, columns: &[f32; 16]) {
        unsafe { gl::ProgramUniformMatrix4fv(program, location, 1, gl::FALSE, columns.as_ptr()) }
    }

    fn create_buffer(&self) -> GlName {
        let mut buffer: GLuint = 0;
        unsafe { gl::GenBuffers(1, &mut buffer) };
        buffer
    }

    fn buffer_data(&self, buffer: GlName, data: &[u8]) {
        let size = GLsizeiptr::try_from(data.len()).unwrap_or(GLsizeiptr::MAX);
        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, buffer);
            gl::BufferData(gl::ARRAY_BUFFER, size, data.as_ptr().cast(), gl::STATIC_DRAW);
        }
    }

    fn delete_buffer(&self, buffer: GlName) {
        unsafe { gl::DeleteBuffers(1, &buffer) }
    }

    fn create_vertex_array(&self) -> GlName {
        let mut vertex_array: GLuint = 0;
        unsafe { gl::GenVertexArrays(1, &mut vertex_array) };
        vertex_array
    }

    fn bind_vertex_array(&self, vertex_array: GlName) {
        unsafe { gl::BindVertexArray(vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: GlName) {
        unsafe { gl::DeleteVertexArrays(1, &vertex_array) }
    }

    fn enable_vertex_attrib(&self, index: u32) {
        unsafe { gl::EnableVertexAttribArray(index) }
    }

    fn disable_vertex_attrib(&self, index: u32) {
        unsafe { gl::DisableVertexAttribArray(index) }
    }

    fn vertex_attrib_f32(&self, index: u32, buffer: GlName, components: i32) {
        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, buffer);
            gl::VertexAttribPointer(index, components, gl::FLOAT, gl::FALSE, 0, ptr::null());
        }
    }

    fn enable(&self, capability: u32) {
        unsafe { gl::Enable(capability) }
    }

    fn viewport(&self, width: i32, height: i32) {
        unsafe { gl::Viewport(0, 0, width, height) }
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        unsafe { gl::ClearColor(r, g, b, a) }
    }

    fn clear(&self) {
        unsafe { gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT) }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { gl::DrawArrays(mode, first, count) }
    }

    fn error(&self) -> u32 {
        unsafe { gl::GetError() }
    }
}
