//! Move-only ownership of OpenGL object names.
//!
//! [`UniqueHandle`] pairs a raw name with the delete call for its object kind
//! (the `K` parameter) and the API it was created through. Dropping a handle
//! releases the name exactly once; taking from a handle leaves `0` behind so
//! the emptied value drops as a no-op.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use crate::glapi::{GlApi, GlName};

/// Names the release call for one kind of GL object.
pub trait GlObject {
    const KIND: &'static str;

    fn release<G: GlApi + ?Sized>(gl: &G, name: GlName);
}

#[derive(Debug)]
pub enum ShaderObject {}

#[derive(Debug)]
pub enum ProgramObject {}

#[derive(Debug)]
pub enum BufferObject {}

#[derive(Debug)]
pub enum VertexArrayObject {}

impl GlObject for ShaderObject {
    const KIND: &'static str = "shader";

    fn release<G: GlApi + ?Sized>(gl: &G, name: GlName) {
        gl.delete_shader(name);
    }
}

impl GlObject for ProgramObject {
    const KIND: &'static str = "program";

    fn release<G: GlApi + ?Sized>(gl: &G, name: GlName) {
        gl.delete_program(name);
    }
}

impl GlObject for BufferObject {
    const KIND: &'static str = "buffer";

    fn release<G: GlApi + ?Sized>(gl: &G, name: GlName) {
        gl.delete_buffer(name);
    }
}

impl GlObject for VertexArrayObject {
    const KIND: &'static str = "vertex array";

    fn release<G: GlApi + ?Sized>(gl: &G, name: GlName) {
        gl.delete_vertex_array(name);
    }
}

pub type ShaderHandle<G> = UniqueHandle<G, ShaderObject>;
pub type ProgramHandle<G> = UniqueHandle<G, ProgramObject>;
pub type BufferHandle<G> = UniqueHandle<G, BufferObject>;
pub type VertexArrayHandle<G> = UniqueHandle<G, VertexArrayObject>;

/// Sole owner of a GL object name.
pub struct UniqueHandle<G: GlApi + Clone, K: GlObject> {
    gl: G,
    name: GlName,
    _kind: PhantomData<K>,
}

impl<G: GlApi + Clone, K: GlObject> UniqueHandle<G, K> {
    /// Adopts `name`; the handle will release it on drop unless it is `0`.
    pub fn new(gl: G, name: GlName) -> Self {
        Self {
            gl,
            name,
            _kind: PhantomData,
        }
    }

    /// An empty handle that owns nothing.
    pub fn null(gl: G) -> Self {
        Self::new(gl, 0)
    }

    pub fn name(&self) -> GlName {
        self.name
    }

    pub fn is_null(&self) -> bool {
        self.name == 0
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    /// Moves ownership into the returned handle, leaving `self` null.
    pub fn take(&mut self) -> Self {
        Self::new(self.gl.clone(), mem::replace(&mut self.name, 0))
    }

    /// Releases the object now. Calling it again is a no-op.
    pub fn reset(&mut self) {
        let name = mem::replace(&mut self.name, 0);
        if name != 0 {
            tracing::trace!(kind = K::KIND, name, "releasing GL object");
            K::release(&self.gl, name);
        }
    }

    /// Gives up ownership without releasing the object.
    pub fn into_raw(mut self) -> GlName {
        mem::replace(&mut self.name, 0)
    }
}

impl<G: GlApi + Clone, K: GlObject> Drop for UniqueHandle<G, K> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<G: GlApi + Clone, K: GlObject> fmt::Debug for UniqueHandle<G, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueHandle")
            .field("kind", &K::KIND)
            .field("name", &self.name)
            .finish()
    }
}
