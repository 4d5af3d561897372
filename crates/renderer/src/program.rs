//! Linked shader programs.
//!
//! A [`ShaderProgram`] is built in one shot from an ordered list of stages:
//!
//! ```text
//!   ShaderSource[] ──▶ compile_shader() per stage ──▶ attach ──▶ link
//!                            │ first failure             │
//!                            ▼                           ▼ detach + delete stages
//!                      ShaderError::Compile     ShaderError::Link | ShaderProgram
//! ```
//!
//! Stage objects only live for the duration of [`ShaderProgram::new`]; the
//! returned value owns nothing but the program name.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use glam::Mat4;
use thiserror::Error;

use crate::compile::{clean_log, compile_shader};
use crate::glapi::{GlApi, GlName};
use crate::handle::ProgramHandle;
use crate::types::{ShaderSource, ShaderStage};

/// Why a program could not be built.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("no shader stages were supplied")]
    Empty,
    #[error("failed to read shader source {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot infer shader stage from {}", path.display())]
    UnknownStage { path: PathBuf },
    #[error("failed to compile {stage} shader:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("failed to link shader program:\n{log}")]
    Link { log: String },
}

/// Owns one linked GL program object.
pub struct ShaderProgram<G: GlApi + Clone> {
    program: ProgramHandle<G>,
}

impl<G: GlApi + Clone> ShaderProgram<G> {
    /// Compiles every stage in order and links them.
    ///
    /// Fails on the first stage that does not compile without touching the
    /// rest. Whatever the outcome, no stage objects survive the call, and on
    /// failure the program object is gone too.
    pub fn new(gl: &G, sources: &[ShaderSource<'_>]) -> Result<Self, ShaderError> {
        if sources.is_empty() {
            return Err(ShaderError::Empty);
        }

        let shaders = sources
            .iter()
            .map(|source| compile_shader(gl, source))
            .collect::<Result<Vec<_>, _>>()?;

        let program = ProgramHandle::new(gl.clone(), gl.create_program());
        if program.is_null() {
            return Err(ShaderError::Link {
                log: "driver did not allocate a program object".to_string(),
            });
        }

        for shader in &shaders {
            gl.attach_shader(program.name(), shader.name());
        }
        gl.link_program(program.name());
        let linked = gl.program_link_status(program.name());
        let log = if linked {
            None
        } else {
            Some(clean_log(gl.program_info_log(program.name())))
        };

        for shader in &shaders {
            gl.detach_shader(program.name(), shader.name());
        }
        drop(shaders);

        if let Some(log) = log {
            return Err(ShaderError::Link { log });
        }

        tracing::debug!(
            program = program.name(),
            stages = sources.len(),
            "linked shader program"
        );
        Ok(Self { program })
    }

    /// Makes this program current for subsequent draw calls.
    ///
    /// # Panics
    ///
    /// Panics when the program was moved out with [`ShaderProgram::take`].
    pub fn use_program(&self) {
        assert!(
            !self.program.is_null(),
            "use_program called on an empty shader program"
        );
        self.program.gl().use_program(self.program.name());
    }

    /// Uploads `matrix` to the `mat4` uniform at `location`.
    pub fn set_uniform_mat4(&self, location: i32, matrix: &Mat4) {
        self.program
            .gl()
            .program_uniform_mat4(self.program.name(), location, &matrix.to_cols_array());
    }

    pub fn name(&self) -> GlName {
        self.program.name()
    }

    pub fn is_null(&self) -> bool {
        self.program.is_null()
    }

    /// Moves the program out, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        Self {
            program: self.program.take(),
        }
    }
}

impl<G: GlApi + Clone> fmt::Debug for ShaderProgram<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program.name())
            .finish()
    }
}

/// Builds a program from GLSL files, one stage per file.
///
/// The stage of each file comes from its extension (`.vert`, `.frag`, ...).
pub fn load_shader_program<G, P>(gl: &G, paths: &[P]) -> Result<ShaderProgram<G>, ShaderError>
where
    G: GlApi + Clone,
    P: AsRef<Path>,
{
    let sources = paths
        .iter()
        .map(ShaderSource::glsl_path)
        .collect::<Result<Vec<_>, _>>()?;
    ShaderProgram::new(gl, &sources)
}
