use anyhow::{bail, Result};
use glam::{Mat4, Vec3};

use crate::gl;
use crate::glapi::GlApi;
use crate::handle::{BufferHandle, VertexArrayHandle};
use crate::program::ShaderProgram;

/// Uniform location of `MVP` in the bundled vertex shader.
pub const MVP_LOCATION: i32 = 0;
pub const POSITION_ATTRIBUTE: u32 = 0;
pub const COLOUR_ATTRIBUTE: u32 = 1;

const CLEAR_COLOUR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const COMPONENTS: i32 = 4;
const VERTEX_COUNT: i32 = 3;

#[rustfmt::skip]
const POSITIONS: [f32; 12] = [
    -2.0, -2.0, 0.0, 1.0,
     2.0, -2.0, 0.0, 1.0,
     0.0,  2.0, 0.0, 1.0,
];

#[rustfmt::skip]
const COLOURS: [f32; 12] = [
    1.0, 0.0, 0.0, 1.0,
    0.0, 1.0, 0.0, 1.0,
    0.0, 0.0, 1.0, 1.0,
];

/// Perspective camera five units down +Z looking at the origin.
pub fn model_view_projection(width: u32, height: u32) -> Mat4 {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    let projection = Mat4::perspective_rh_gl(45f32.to_radians(), aspect, 0.01, 100.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let model = Mat4::IDENTITY;
    projection * view * model
}

/// Binds `program`, uploads the camera for a `width`x`height` target and sets
/// the fixed pipeline state every frame relies on.
pub fn prepare_pipeline<G: GlApi + Clone>(
    gl: &G,
    program: &ShaderProgram<G>,
    width: u32,
    height: u32,
    multisample: bool,
) {
    program.use_program();
    program.set_uniform_mat4(MVP_LOCATION, &model_view_projection(width, height));
    if multisample {
        gl.enable(gl::MULTISAMPLE);
    }
    gl.viewport(
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    );
    gl.clear_color(CLEAR_COLOUR);
}

/// One RGB triangle with per-vertex colours.
pub struct TriangleScene<G: GlApi + Clone> {
    gl: G,
    vertex_array: VertexArrayHandle<G>,
    positions: BufferHandle<G>,
    colours: BufferHandle<G>,
}

impl<G: GlApi + Clone> TriangleScene<G> {
    /// Uploads the vertex data and leaves the vertex array bound.
    pub fn new(gl: &G) -> Result<Self> {
        let vertex_array = VertexArrayHandle::new(gl.clone(), gl.create_vertex_array());
        if vertex_array.is_null() {
            bail!("failed to allocate vertex array");
        }
        gl.bind_vertex_array(vertex_array.name());

        let positions = upload(gl, &POSITIONS)?;
        let colours = upload(gl, &COLOURS)?;
        tracing::debug!(
            vertex_array = vertex_array.name(),
            positions = positions.name(),
            colours = colours.name(),
            "uploaded triangle vertex buffers"
        );

        Ok(Self {
            gl: gl.clone(),
            vertex_array,
            positions,
            colours,
        })
    }

    /// Issues the draw call; the caller binds the program.
    pub fn draw(&self) {
        let gl = &self.gl;
        gl.bind_vertex_array(self.vertex_array.name());
        gl.enable_vertex_attrib(POSITION_ATTRIBUTE);
        gl.vertex_attrib_f32(POSITION_ATTRIBUTE, self.positions.name(), COMPONENTS);
        gl.enable_vertex_attrib(COLOUR_ATTRIBUTE);
        gl.vertex_attrib_f32(COLOUR_ATTRIBUTE, self.colours.name(), COMPONENTS);
        gl.draw_arrays(gl::TRIANGLES, 0, VERTEX_COUNT);
        gl.disable_vertex_attrib(POSITION_ATTRIBUTE);
        gl.disable_vertex_attrib(COLOUR_ATTRIBUTE);
    }
}

fn upload<G: GlApi + Clone>(gl: &G, data: &[f32]) -> Result<BufferHandle<G>> {
    let buffer = BufferHandle::new(gl.clone(), gl.create_buffer());
    if buffer.is_null() {
        bail!("failed to allocate vertex buffer");
    }
    gl.buffer_data(buffer.name(), bytemuck::cast_slice(data));
    Ok(buffer)
}
