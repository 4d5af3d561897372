use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use crate::gl;
use crate::program::ShaderError;

/// Default windowed surface size in physical pixels.
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1200, 800);

/// Programmable pipeline stage a shader object is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
    Compute,
}

impl ShaderStage {
    /// The `GL_*_SHADER` enum passed to `glCreateShader`.
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
            ShaderStage::Geometry => gl::GEOMETRY_SHADER,
            ShaderStage::TessControl => gl::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => gl::TESS_EVALUATION_SHADER,
            ShaderStage::Compute => gl::COMPUTE_SHADER,
        }
    }

    /// Infers the stage from the conventional glslang file extensions.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "vert" => Some(ShaderStage::Vertex),
            "frag" => Some(ShaderStage::Fragment),
            "geom" => Some(ShaderStage::Geometry),
            "tesc" => Some(ShaderStage::TessControl),
            "tese" => Some(ShaderStage::TessEvaluation),
            "comp" => Some(ShaderStage::Compute),
            _ => None,
        }
    }

    /// Infers the stage from a path such as `shader.frag`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEvaluation => "tessellation evaluation",
            ShaderStage::Compute => "compute",
        })
    }
}

/// Code handed to the driver for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderPayload<'a> {
    /// GLSL text compiled by the driver.
    Glsl(Cow<'a, str>),
    /// Precompiled SPIR-V module; the slice length is the declared byte length.
    SpirV(Cow<'a, [u8]>),
}

/// Describes a single stage of a program before it is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource<'a> {
    pub stage: ShaderStage,
    pub payload: ShaderPayload<'a>,
}

impl<'a> ShaderSource<'a> {
    pub fn glsl(stage: ShaderStage, source: impl Into<Cow<'a, str>>) -> Self {
        Self {
            stage,
            payload: ShaderPayload::Glsl(source.into()),
        }
    }

    pub fn spirv(stage: ShaderStage, binary: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            stage,
            payload: ShaderPayload::SpirV(binary.into()),
        }
    }
}

impl ShaderSource<'static> {
    /// Reads a GLSL file for `stage`.
    pub fn glsl_file(stage: ShaderStage, path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ShaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::glsl(stage, text))
    }

    /// Reads a GLSL file, taking the stage from its extension.
    pub fn glsl_path(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let stage = ShaderStage::from_path(path).ok_or_else(|| ShaderError::UnknownStage {
            path: path.to_path_buf(),
        })?;
        Self::glsl_file(stage, path)
    }
}

/// How the window is placed on screen.
///
/// * `Windowed` opens a fixed-size, non-resizable window.
/// * `Borderless` covers the primary monitor at its current resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Windowed { width: u32, height: u32 },
    Borderless,
}

impl Default for WindowMode {
    fn default() -> Self {
        let (width, height) = DEFAULT_WINDOW_SIZE;
        Self::Windowed { width, height }
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window title.
    pub title: String,
    /// Windowed vs borderless fullscreen placement.
    pub window_mode: WindowMode,
    /// MSAA samples requested from the framebuffer config (0 disables).
    pub samples: u8,
    /// Wait for vertical blank between swaps.
    pub vsync: bool,
    /// Request a debug context and forward driver messages to `tracing`.
    pub debug_output: bool,
    /// Stages linked into the program, in attachment order.
    pub shaders: Vec<ShaderSource<'static>>,
}

impl Default for RendererConfig {
    /// A 1200x800 debug window with 4x MSAA and no shaders selected.
    fn default() -> Self {
        Self {
            title: "SPIR-V test".to_string(),
            window_mode: WindowMode::default(),
            samples: 4,
            vsync: true,
            debug_output: true,
            shaders: Vec::new(),
        }
    }
}
