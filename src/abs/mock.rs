//! In-memory stand-in for the GL driver, used by unit tests.
//!
//! Compilation fails on unbalanced braces or a missing `main`. Linking checks that every
//! fragment `in` has a vertex `out` with the same name and type. Uniform uploads go to the bound
//! program, and misuse is recorded as a diagnostic instead of a driver error.

use std::{cell::RefCell, collections::HashMap};

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::shader::{ShaderBackend, ShaderKind};

struct MockShader {
    kind: ShaderKind,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct MockProgram {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: HashMap<String, u32>,
    values: HashMap<u32, Vec<f32>>,
}

#[derive(Default)]
struct MockState {
    next_id: u32,
    shaders: HashMap<u32, MockShader>,
    programs: HashMap<u32, MockProgram>,
    current: Option<u32>,
    shaders_created: usize,
    uniform_lookups: usize,
    diagnostics: Vec<String>,
}

impl MockState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MockGl {
    state: RefCell<MockState>,
}

impl MockGl {
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn shaders_created(&self) -> usize {
        self.state.borrow().shaders_created
    }

    pub fn uniform_lookups(&self) -> usize {
        self.state.borrow().uniform_lookups
    }

    pub fn current_program(&self) -> Option<u32> {
        self.state.borrow().current
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.state.borrow().diagnostics.clone()
    }

    /// Records a draw call, flagging it when no linked program is bound.
    pub fn submit_draw(&self) {
        let mut state = self.state.borrow_mut();
        let usable = state
            .current
            .and_then(|id| state.programs.get(&id))
            .is_some_and(|program| program.linked);
        if !usable {
            state
                .diagnostics
                .push("GL_INVALID_OPERATION: draw without a usable program".to_owned());
        }
    }

    fn upload(&self, location: u32, value: Vec<f32>) {
        let mut state = self.state.borrow_mut();
        let Some(current) = state.current else {
            state
                .diagnostics
                .push("GL_INVALID_OPERATION: uniform upload without a bound program".to_owned());
            return;
        };
        let program = state.programs.get_mut(&current).map(|program| {
            let known = program.uniforms.values().any(|&l| l == location);
            if known {
                program.values.insert(location, value);
            }
            known
        });
        if program != Some(true) {
            state.diagnostics.push(format!(
                "GL_INVALID_OPERATION: location {location} does not belong to program {current}"
            ));
        }
    }

    fn read(&self, program: u32, location: u32) -> Vec<f32> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.values.get(&location))
            .cloned()
            .unwrap_or_default()
    }
}

/// `(type, name)` pairs for declarations such as `layout (location = 0) in vec3 aPos;`.
fn declarations<'a>(source: &'a str, qualifier: &str) -> Vec<(&'a str, &'a str)> {
    source
        .lines()
        .filter_map(|line| {
            let mut line = line.trim();
            if line.starts_with("layout") {
                line = line.split_once(')')?.1.trim();
            }
            let rest = line.strip_prefix(qualifier)?.strip_prefix(' ')?;
            let mut parts = rest.split_whitespace();
            let ty = parts.next()?;
            let name = parts.next()?.trim_end_matches(';');
            Some((ty, name))
        })
        .collect()
}

fn compile_errors(source: &str) -> Option<String> {
    let opened = source.matches('{').count();
    let closed = source.matches('}').count();
    if opened != closed {
        return Some(format!(
            "0:{}(1): error: syntax error, unexpected end of file",
            source.lines().count()
        ));
    }
    if !source.contains("void main") {
        return Some("0:1(1): error: function `main' is not defined".to_owned());
    }
    None
}

impl ShaderBackend for MockGl {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = u32;

    fn create_shader_object(&self, kind: ShaderKind) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.shaders_created += 1;
        state.shaders.insert(
            id,
            MockShader {
                kind,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Ok(id)
    }

    fn compile_shader_source(&self, shader: u32, source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(entry) = state.shaders.get_mut(&shader) else {
            return false;
        };
        entry.source = source.to_owned();
        match compile_errors(source) {
            Some(log) => {
                entry.compiled = false;
                entry.log = log;
            }
            None => {
                entry.compiled = true;
                entry.log.clear();
            }
        }
        entry.compiled
    }

    fn shader_log(&self, shader: u32) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader_object(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program_object(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.programs.insert(id, MockProgram::default());
        Ok(id)
    }

    fn attach_to_program(&self, program: u32, shader: u32) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_from_program(&self, program: u32, shader: u32) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
            p.attached.retain(|&s| s != shader);
        }
    }

    fn link_program_object(&self, program: u32) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(attached) = state.programs.get(&program).map(|p| p.attached.clone()) else {
            return false;
        };

        let sources = {
            let stage = |kind: ShaderKind| {
                attached
                    .iter()
                    .filter_map(|id| state.shaders.get(id))
                    .find(|s| s.kind == kind && s.compiled)
                    .map(|s| s.source.clone())
            };
            (stage(ShaderKind::Vertex), stage(ShaderKind::Fragment))
        };
        let (Some(vertex), Some(fragment)) = sources else {
            if let Some(p) = state.programs.get_mut(&program) {
                p.log = "error: program needs a compiled vertex and fragment shader".to_owned();
            }
            return false;
        };

        let outputs = declarations(&vertex, "out");
        let mut errors = Vec::new();
        for (ty, name) in declarations(&fragment, "in") {
            if !outputs.contains(&(ty, name)) {
                errors.push(format!(
                    "error: fragment shader input `{name}` of type {ty} has no matching vertex shader output"
                ));
            }
        }

        let mut uniforms = HashMap::new();
        for source in [&vertex, &fragment] {
            for (_, name) in declarations(source, "uniform") {
                let next = uniforms.len() as u32;
                uniforms.entry(name.to_owned()).or_insert(next);
            }
        }

        let Some(p) = state.programs.get_mut(&program) else {
            return false;
        };
        p.linked = errors.is_empty();
        p.log = errors.join("\n");
        p.uniforms = uniforms;
        p.values.clear();
        p.linked
    }

    fn program_log(&self, program: u32) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program_object(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current == Some(program) {
            state.current = None;
        }
    }

    fn bound_program(&self) -> Option<u32> {
        self.state.borrow().current
    }

    fn bind_program(&self, program: Option<u32>) {
        let mut state = self.state.borrow_mut();
        if let Some(id) = program {
            if !state.programs.get(&id).is_some_and(|p| p.linked) {
                state
                    .diagnostics
                    .push(format!("GL_INVALID_OPERATION: program {id} is not linked"));
                return;
            }
        }
        state.current = program;
    }

    fn find_uniform(&self, program: u32, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        state.uniform_lookups += 1;
        state
            .programs
            .get(&program)
            .and_then(|p| p.uniforms.get(name))
            .copied()
    }

    fn set_uniform_i32(&self, location: &u32, value: i32) {
        self.upload(*location, vec![value as f32]);
    }

    fn set_uniform_f32(&self, location: &u32, value: f32) {
        self.upload(*location, vec![value]);
    }

    fn set_uniform_vec2(&self, location: &u32, value: Vec2) {
        self.upload(*location, value.to_array().to_vec());
    }

    fn set_uniform_vec3(&self, location: &u32, value: Vec3) {
        self.upload(*location, value.to_array().to_vec());
    }

    fn set_uniform_vec4(&self, location: &u32, value: Vec4) {
        self.upload(*location, value.to_array().to_vec());
    }

    fn set_uniform_mat4(&self, location: &u32, value: &Mat4) {
        self.upload(*location, value.to_cols_array().to_vec());
    }

    fn read_uniform_f32(&self, program: u32, location: &u32, out: &mut [f32]) {
        let values = self.read(program, *location);
        for (slot, value) in out.iter_mut().zip(values.iter().chain(std::iter::repeat(&0.0))) {
            *slot = *value;
        }
    }

    fn read_uniform_i32(&self, program: u32, location: &u32, out: &mut [i32]) {
        let values = self.read(program, *location);
        for (slot, value) in out.iter_mut().zip(values.iter().chain(std::iter::repeat(&0.0))) {
            *slot = *value as i32;
        }
    }
}
