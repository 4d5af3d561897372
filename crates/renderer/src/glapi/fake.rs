use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use super::{GlApi, GlName, SPIRV_ENTRY_POINT};
use crate::gl;
use crate::types::ShaderStage;

const SPIRV_MAGIC: [u8; 4] = [0x03, 0x02, 0x23, 0x07];
const SPIRV_HEADER_BYTES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DrawCall {
    pub program: GlName,
    pub vertex_array: GlName,
    pub mode: u32,
    pub first: i32,
    pub count: i32,
}

#[derive(Debug)]
struct FakeShader {
    stage: ShaderStage,
    glsl: Option<String>,
    binary: Option<Vec<u8>>,
    entry_point: Option<String>,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct FakeProgram {
    attached: Vec<GlName>,
    linked: bool,
    log: String,
}

#[derive(Debug, Default)]
struct FakeState {
    next_name: GlName,
    refuse_shaders: bool,
    refuse_programs: bool,
    shaders: BTreeMap<GlName, FakeShader>,
    programs: BTreeMap<GlName, FakeProgram>,
    buffers: BTreeMap<GlName, Vec<u8>>,
    vertex_arrays: BTreeSet<GlName>,
    shaders_created: usize,
    compile_attempts: usize,
    shader_deletes: usize,
    program_deletes: usize,
    buffer_deletes: usize,
    vertex_array_deletes: usize,
    double_deletes: usize,
    deleted_while_attached: usize,
    current_program: GlName,
    bound_vertex_array: GlName,
    enabled_attribs: BTreeSet<u32>,
    attrib_buffers: BTreeMap<u32, (GlName, i32)>,
    capabilities: BTreeSet<u32>,
    clear_color: [f32; 4],
    uniforms: BTreeMap<(GlName, i32), [f32; 16]>,
    draws: Vec<DrawCall>,
    errors: VecDeque<u32>,
}

impl FakeState {
    fn allocate(&mut self) -> GlName {
        self.next_name += 1;
        self.next_name
    }

    fn is_attached(&self, shader: GlName) -> bool {
        self.programs
            .values()
            .any(|program| program.attached.contains(&shader))
    }

    fn link(&self, program: &FakeProgram) -> Result<(), String> {
        if program.attached.is_empty() {
            return Err("error: no shaders attached to program".to_string());
        }
        let mut vertex_outputs = Vec::new();
        let mut fragment_inputs = Vec::new();
        for name in &program.attached {
            let shader = &self.shaders[name];
            if !shader.compiled {
                return Err(format!("error: {} shader {name} is not compiled", shader.stage));
            }
            if let Some(glsl) = &shader.glsl {
                match shader.stage {
                    ShaderStage::Vertex => vertex_outputs.extend(interface(glsl, "out")),
                    ShaderStage::Fragment => fragment_inputs.extend(interface(glsl, "in")),
                    _ => {}
                }
            }
        }
        for input in fragment_inputs {
            if !vertex_outputs.contains(&input) {
                return Err(format!(
                    "error: fragment shader input `{input}` has no matching vertex shader output"
                ));
            }
        }
        Ok(())
    }
}

/// Collects the variable names declared with `qualifier` (`in` / `out`).
fn interface(source: &str, qualifier: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let mut line = line.trim();
            if let Some(rest) = line.strip_prefix("layout") {
                line = rest.split_once(')')?.1.trim();
            }
            let mut words = line.split_whitespace();
            if words.next()? != qualifier {
                return None;
            }
            let _ty = words.next()?;
            let name = words.next()?.trim_end_matches(';');
            Some(name.to_string())
        })
        .collect()
}

/// Minimal SPIR-V header suitable for the fake driver.
pub(crate) fn spirv_stub() -> Vec<u8> {
    let mut module = SPIRV_MAGIC.to_vec();
    module.extend_from_slice(&[0x00, 0x00, 0x01, 0x00]);
    module.resize(SPIRV_HEADER_BYTES, 0);
    module
}

/// Resource-counting stand-in for a GL context.
///
/// GLSL compiles when the text has a `#version` line, a `main` and no
/// `#error`. SPIR-V compiles after specialisation when it starts with the
/// module magic, is word aligned and the entry point is `main`. Linking
/// checks that every fragment `in` has a vertex `out` of the same name.
#[derive(Clone, Default)]
pub(crate) struct FakeGl {
    state: Rc<RefCell<FakeState>>,
}

impl FakeGl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse_shader_creation(&self) {
        self.state.borrow_mut().refuse_shaders = true;
    }

    pub fn refuse_program_creation(&self) {
        self.state.borrow_mut().refuse_programs = true;
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn shaders_created(&self) -> usize {
        self.state.borrow().shaders_created
    }

    pub fn compile_attempts(&self) -> usize {
        self.state.borrow().compile_attempts
    }

    pub fn shader_deletes(&self) -> usize {
        self.state.borrow().shader_deletes
    }

    pub fn program_deletes(&self) -> usize {
        self.state.borrow().program_deletes
    }

    pub fn buffer_deletes(&self) -> usize {
        self.state.borrow().buffer_deletes
    }

    pub fn vertex_array_deletes(&self) -> usize {
        self.state.borrow().vertex_array_deletes
    }

    pub fn double_deletes(&self) -> usize {
        self.state.borrow().double_deletes
    }

    pub fn deleted_while_attached(&self) -> usize {
        self.state.borrow().deleted_while_attached
    }

    pub fn current_program(&self) -> GlName {
        self.state.borrow().current_program
    }

    pub fn attached(&self, program: GlName) -> Vec<GlName> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|program| program.attached.clone())
            .unwrap_or_default()
    }

    pub fn entry_point(&self, shader: GlName) -> Option<String> {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .and_then(|shader| shader.entry_point.clone())
    }

    pub fn buffer(&self, buffer: GlName) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn uniform(&self, program: GlName, location: i32) -> Option<[f32; 16]> {
        self.state.borrow().uniforms.get(&(program, location)).copied()
    }

    pub fn is_enabled(&self, capability: u32) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    pub fn enabled_attribs(&self) -> Vec<u32> {
        self.state.borrow().enabled_attribs.iter().copied().collect()
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    fn record_error(&self, code: u32) {
        self.state.borrow_mut().errors.push_back(code);
    }

    fn with_shader(&self, shader: GlName, update: impl FnOnce(&mut FakeShader)) {
        let mut state = self.state.borrow_mut();
        let found = match state.shaders.get_mut(&shader) {
            Some(entry) => {
                update(entry);
                true
            }
            None => false,
        };
        if !found {
            state.errors.push_back(gl::INVALID_VALUE);
        }
    }
}

impl GlApi for FakeGl {
    fn create_shader(&self, stage: ShaderStage) -> GlName {
        let mut state = self.state.borrow_mut();
        if state.refuse_shaders {
            return 0;
        }
        let name = state.allocate();
        state.shaders_created += 1;
        state.shaders.insert(
            name,
            FakeShader {
                stage,
                glsl: None,
                binary: None,
                entry_point: None,
                compiled: false,
                log: String::new(),
            },
        );
        name
    }

    fn shader_source(&self, shader: GlName, source: &str) {
        self.with_shader(shader, |entry| entry.glsl = Some(source.to_string()));
    }

    fn compile_shader(&self, shader: GlName) {
        self.state.borrow_mut().compile_attempts += 1;
        self.with_shader(shader, |entry| {
            let source = entry.glsl.clone().unwrap_or_default();
            if !source.contains("#version") {
                entry.compiled = false;
                entry.log = "ERROR: 0:1: '' : missing #version directive\n\0".to_string();
            } else if source.contains("#error") || !source.contains("main") {
                entry.compiled = false;
                entry.log = format!("ERROR: 0:1: syntax error in {} shader\n\0", entry.stage);
            } else {
                entry.compiled = true;
                entry.log.clear();
            }
        });
    }

    fn shader_binary_spirv(&self, shader: GlName, binary: &[u8]) {
        self.with_shader(shader, |entry| {
            entry.binary = Some(binary.to_vec());
            entry.compiled = false;
        });
    }

    fn specialize_shader(&self, shader: GlName, entry_point: &str) {
        self.state.borrow_mut().compile_attempts += 1;
        self.with_shader(shader, |entry| {
            entry.entry_point = Some(entry_point.to_string());
            let binary = entry.binary.as_deref().unwrap_or_default();
            let valid_module = binary.len() >= SPIRV_HEADER_BYTES
                && binary.len() % 4 == 0
                && binary.starts_with(&SPIRV_MAGIC);
            if !valid_module {
                entry.compiled = false;
                entry.log = "SPIR-V module is not valid\n".to_string();
            } else if entry_point != SPIRV_ENTRY_POINT {
                entry.compiled = false;
                entry.log = format!("entry point `{entry_point}` not found in module\n");
            } else {
                entry.compiled = true;
                entry.log.clear();
            }
        });
    }

    fn shader_compile_status(&self, shader: GlName) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|entry| entry.compiled)
    }

    fn shader_info_log(&self, shader: GlName) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|entry| entry.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: GlName) {
        if shader == 0 {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.is_attached(shader) {
            state.deleted_while_attached += 1;
        }
        if state.shaders.remove(&shader).is_some() {
            state.shader_deletes += 1;
        } else {
            state.double_deletes += 1;
            state.errors.push_back(gl::INVALID_VALUE);
        }
    }

    fn create_program(&self) -> GlName {
        let mut state = self.state.borrow_mut();
        if state.refuse_programs {
            return 0;
        }
        let name = state.allocate();
        state.programs.insert(name, FakeProgram::default());
        name
    }

    fn attach_shader(&self, program: GlName, shader: GlName) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            state.errors.push_back(gl::INVALID_VALUE);
            return;
        }
        let error = match state.programs.get_mut(&program) {
            Some(entry) if entry.attached.contains(&shader) => Some(gl::INVALID_OPERATION),
            Some(entry) => {
                entry.attached.push(shader);
                None
            }
            None => Some(gl::INVALID_VALUE),
        };
        if let Some(code) = error {
            state.errors.push_back(code);
        }
    }

    fn detach_shader(&self, program: GlName, shader: GlName) {
        let mut state = self.state.borrow_mut();
        let Some(entry) = state.programs.get_mut(&program) else {
            state.errors.push_back(gl::INVALID_VALUE);
            return;
        };
        let before = entry.attached.len();
        entry.attached.retain(|attached| *attached != shader);
        if entry.attached.len() == before {
            state.errors.push_back(gl::INVALID_OPERATION);
        }
    }

    fn link_program(&self, program: GlName) {
        let mut state = self.state.borrow_mut();
        let Some(entry) = state.programs.get(&program) else {
            state.errors.push_back(gl::INVALID_VALUE);
            return;
        };
        let outcome = state.link(entry);
        if let Some(entry) = state.programs.get_mut(&program) {
            match outcome {
                Ok(()) => {
                    entry.linked = true;
                    entry.log.clear();
                }
                Err(log) => {
                    entry.linked = false;
                    entry.log = log;
                }
            }
        }
    }

    fn program_link_status(&self, program: GlName) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|entry| entry.linked)
    }

    fn program_info_log(&self, program: GlName) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|entry| entry.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: GlName) {
        let mut state = self.state.borrow_mut();
        let linked = program == 0 || state.programs.get(&program).is_some_and(|p| p.linked);
        if linked {
            state.current_program = program;
        } else {
            state.errors.push_back(gl::INVALID_OPERATION);
        }
    }

    fn delete_program(&self, program: GlName) {
        if program == 0 {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program).is_some() {
            state.program_deletes += 1;
            if state.current_program == program {
                state.current_program = 0;
            }
        } else {
            state.double_deletes += 1;
            state.errors.push_back(gl::INVALID_VALUE);
        }
    }

    fn program_uniform_mat4(&self, program: GlName, location: i32, columns: &[f32; 16]) {
        let mut state = self.state.borrow_mut();
        if state.programs.get(&program).is_some_and(|p| p.linked) {
            state.uniforms.insert((program, location), *columns);
        } else {
            state.errors.push_back(gl::INVALID_OPERATION);
        }
    }

    fn create_buffer(&self) -> GlName {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        state.buffers.insert(name, Vec::new());
        name
    }

    fn buffer_data(&self, buffer: GlName, data: &[u8]) {
        let stored = match self.state.borrow_mut().buffers.get_mut(&buffer) {
            Some(contents) => {
                *contents = data.to_vec();
                true
            }
            None => false,
        };
        if !stored {
            self.record_error(gl::INVALID_OPERATION);
        }
    }

    fn delete_buffer(&self, buffer: GlName) {
        if buffer == 0 {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer).is_some() {
            state.buffer_deletes += 1;
            state.attrib_buffers.retain(|_, (bound, _)| *bound != buffer);
        } else {
            state.double_deletes += 1;
        }
    }

    fn create_vertex_array(&self) -> GlName {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        state.vertex_arrays.insert(name);
        name
    }

    fn bind_vertex_array(&self, vertex_array: GlName) {
        let mut state = self.state.borrow_mut();
        if vertex_array == 0 || state.vertex_arrays.contains(&vertex_array) {
            state.bound_vertex_array = vertex_array;
        } else {
            state.errors.push_back(gl::INVALID_OPERATION);
        }
    }

    fn delete_vertex_array(&self, vertex_array: GlName) {
        if vertex_array == 0 {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.remove(&vertex_array) {
            state.vertex_array_deletes += 1;
            if state.bound_vertex_array == vertex_array {
                state.bound_vertex_array = 0;
            }
        } else {
            state.double_deletes += 1;
        }
    }

    fn enable_vertex_attrib(&self, index: u32) {
        self.state.borrow_mut().enabled_attribs.insert(index);
    }

    fn disable_vertex_attrib(&self, index: u32) {
        self.state.borrow_mut().enabled_attribs.remove(&index);
    }

    fn vertex_attrib_f32(&self, index: u32, buffer: GlName, components: i32) {
        let mut state = self.state.borrow_mut();
        if state.bound_vertex_array == 0 || !state.buffers.contains_key(&buffer) {
            state.errors.push_back(gl::INVALID_OPERATION);
            return;
        }
        state.attrib_buffers.insert(index, (buffer, components));
    }

    fn enable(&self, capability: u32) {
        self.state.borrow_mut().capabilities.insert(capability);
    }

    fn viewport(&self, _width: i32, _height: i32) {}

    fn clear_color(&self, rgba: [f32; 4]) {
        self.state.borrow_mut().clear_color = rgba;
    }

    fn clear(&self) {}

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        let mut state = self.state.borrow_mut();
        let attribs_ready = state.enabled_attribs.iter().all(|index| {
            state
                .attrib_buffers
                .get(index)
                .and_then(|(buffer, components)| {
                    let bytes = state.buffers.get(buffer)?.len();
                    let needed = (first + count) as usize * *components as usize * 4;
                    Some(bytes >= needed)
                })
                .unwrap_or(false)
        });
        if state.current_program == 0 || state.bound_vertex_array == 0 || !attribs_ready {
            state.errors.push_back(gl::INVALID_OPERATION);
            return;
        }
        let call = DrawCall {
            program: state.current_program,
            vertex_array: state.bound_vertex_array,
            mode,
            first,
            count,
        };
        state.draws.push(call);
    }

    fn error(&self) -> u32 {
        self.state
            .borrow_mut()
            .errors
            .pop_front()
            .unwrap_or(gl::NO_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_reads_layout_qualified_declarations() {
        let source = "layout(location = 0) out vec4 vertexColour;\nout vec2 uv;\nin vec4 position;";
        assert_eq!(interface(source, "out"), vec!["vertexColour", "uv"]);
        assert_eq!(interface(source, "in"), vec!["position"]);
    }

    #[test]
    fn spirv_stub_passes_validation() {
        let gl = FakeGl::new();
        let shader = gl.create_shader(ShaderStage::Vertex);
        gl.shader_binary_spirv(shader, &spirv_stub());
        gl.specialize_shader(shader, "main");
        assert!(gl.shader_compile_status(shader));
        gl.delete_shader(shader);
        assert_eq!(gl.error(), gl::NO_ERROR);
    }
}
