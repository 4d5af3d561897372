//! Driver diagnostics from `GL_KHR_debug`.

use std::ffi::{c_void, CStr};
use std::fmt;

use tracing::Level;

use crate::gl;
use crate::gl::types::{GLchar, GLenum, GLsizei, GLuint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugSeverity {
    Notification,
    Low,
    Medium,
    High,
}

impl DebugSeverity {
    pub fn from_gl(severity: GLenum) -> Self {
        match severity {
            gl::DEBUG_SEVERITY_HIGH => Self::High,
            gl::DEBUG_SEVERITY_MEDIUM => Self::Medium,
            gl::DEBUG_SEVERITY_LOW => Self::Low,
            _ => Self::Notification,
        }
    }

    /// Tracing level for the severity. Notifications share `INFO` with `Low`
    /// so the default filter shows every driver message.
    pub fn level(self) -> Level {
        match self {
            Self::High => Level::ERROR,
            Self::Medium => Level::WARN,
            Self::Low | Self::Notification => Level::INFO,
        }
    }
}

/// One message delivered through the debug callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugMessage {
    pub source: GLenum,
    pub kind: GLenum,
    pub id: GLuint,
    pub severity: DebugSeverity,
    pub text: String,
}

impl DebugMessage {
    /// Copies the driver buffer. A negative `length` means NUL-terminated.
    ///
    /// # Safety
    ///
    /// `message` must be null or point to `length` readable bytes (or a
    /// NUL-terminated string when `length` is negative).
    pub unsafe fn from_raw(
        source: GLenum,
        kind: GLenum,
        id: GLuint,
        severity: GLenum,
        length: GLsizei,
        message: *const GLchar,
    ) -> Self {
        let text = if message.is_null() {
            String::new()
        } else if length < 0 {
            CStr::from_ptr(message).to_string_lossy().into_owned()
        } else {
            let bytes = std::slice::from_raw_parts(message.cast::<u8>(), length as usize);
            String::from_utf8_lossy(bytes).into_owned()
        };
        Self {
            source,
            kind,
            id,
            severity: DebugSeverity::from_gl(severity),
            text: text.trim_end_matches(['\0', '\n']).to_string(),
        }
    }

    /// Forwards the message to `tracing` at [`DebugSeverity::level`].
    pub fn emit(&self) {
        let source = source_name(self.source);
        let kind = type_name(self.kind);
        let level = self.severity.level();
        if level == Level::ERROR {
            tracing::error!(source, kind, id = self.id, "[OpenGL] {}", self.text)
        } else if level == Level::WARN {
            tracing::warn!(source, kind, id = self.id, "[OpenGL] {}", self.text)
        } else {
            tracing::info!(source, kind, id = self.id, "[OpenGL] {}", self.text)
        }
    }
}

impl fmt::Display for DebugMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[OpenGL] {} {} #{}: {}",
            source_name(self.source),
            type_name(self.kind),
            self.id,
            self.text
        )
    }
}

/// Callback registered with `glDebugMessageCallback`. Carries no user state.
pub(crate) extern "system" fn gl_debug_callback(
    source: GLenum,
    kind: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _user: *mut c_void,
) {
    let message = unsafe { DebugMessage::from_raw(source, kind, id, severity, length, message) };
    message.emit();
}

fn source_name(source: GLenum) -> &'static str {
    match source {
        gl::DEBUG_SOURCE_API => "api",
        gl::DEBUG_SOURCE_WINDOW_SYSTEM => "window-system",
        gl::DEBUG_SOURCE_SHADER_COMPILER => "shader-compiler",
        gl::DEBUG_SOURCE_THIRD_PARTY => "third-party",
        gl::DEBUG_SOURCE_APPLICATION => "application",
        _ => "other",
    }
}

fn type_name(kind: GLenum) -> &'static str {
    match kind {
        gl::DEBUG_TYPE_ERROR => "error",
        gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "deprecated",
        gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "undefined-behaviour",
        gl::DEBUG_TYPE_PORTABILITY => "portability",
        gl::DEBUG_TYPE_PERFORMANCE => "performance",
        gl::DEBUG_TYPE_MARKER => "marker",
        gl::DEBUG_TYPE_PUSH_GROUP => "push-group",
        gl::DEBUG_TYPE_POP_GROUP => "pop-group",
        _ => "other",
    }
}

/// Symbolic name of a `glGetError` code.
pub fn error_name(code: GLenum) -> &'static str {
    match code {
        gl::NO_ERROR => "GL_NO_ERROR",
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}
