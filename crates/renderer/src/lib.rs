//! Renderer crate for Vitore, a minimal OpenGL 4.6 triangle demo.
//!
//! The interesting part is [`ShaderProgram`]: it compiles GLSL or SPIR-V
//! stages, links them, reports driver diagnostics as typed errors and frees
//! every GL object it creates exactly once. The overall flow is:
//!
//! ```text
//!   CLI / vitore
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState::new ──▶ ShaderProgram::new ──▶ TriangleScene
//!                            │
//!                            └─▶ winit event loop ──▶ render_frame() ──▶ swap_buffers
//! ```
//!
//! All GL calls go through the [`GlApi`] trait. [`NativeGl`] forwards to the
//! loaded driver; the test suite swaps in a recording double so the
//! resource-lifecycle guarantees are checked without a display.

mod compile;
pub mod debug;
#[allow(
    clippy::all,
    non_camel_case_types,
    non_snake_case,
    non_upper_case_globals,
    unused,
    unused_qualifications
)]
mod gl {
    include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
}
pub mod glapi;
pub mod handle;
mod program;
pub mod scene;
mod types;
mod window;

use anyhow::Result;

pub use glapi::{GlApi, GlName, NativeGl};
pub use handle::UniqueHandle;
pub use program::{load_shader_program, ShaderError, ShaderProgram};
pub use scene::TriangleScene;
pub use types::{
    RendererConfig, ShaderPayload, ShaderSource, ShaderStage, WindowMode, DEFAULT_WINDOW_SIZE,
};

/// Entry point used by the binary.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and blocks until it closes.
    ///
    /// Context creation, missing SPIR-V support and shader build failures are
    /// returned before the first frame. Once rendering starts, a failed buffer
    /// swap is logged and ends the loop.
    pub fn run(&mut self) -> Result<()> {
        window::run_window(self.config.clone())
    }
}
