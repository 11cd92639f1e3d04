//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for managing OpenGL shaders,
//! and the [`ShaderProgramBuilder`] which walks a program from source to a linked program.
//! Uniform variables are set through the [`Uniform`] trait on an [`ActiveProgram`], which only
//! exists while its program is bound.
//!
//! Every driver call goes through the [`ShaderBackend`] trait, implemented for [`glow::Context`].

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    num::NonZeroU32,
    path::{Path, PathBuf},
    sync::Arc,
};

use glam::{Mat4, Vec2, Vec3, Vec4};
use glow::HasContext;

/// The stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    /// Returns the OpenGL enum for this stage.
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderKind::Vertex => glow::VERTEX_SHADER,
            ShaderKind::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Build progress of a shader program.
///
/// `CompileFailed`, `LinkFailed` and `Ready` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    Unbuilt,
    Compiling,
    Compiled,
    CompileFailed,
    Linking,
    LinkFailed,
    Ready,
}

impl ProgramState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProgramState::CompileFailed | ProgramState::LinkFailed | ProgramState::Ready
        )
    }
}

/// Errors produced while loading, compiling or linking shaders.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader source {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{kind} shader failed to compile:\n{log}")]
    Compile { kind: ShaderKind, log: String },
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
    #[error("driver refused to allocate a shader object: {0}")]
    Create(String),
    #[error("no {0} shader attached before linking")]
    MissingStage(ShaderKind),
    #[error("cannot {operation} while the program is {state:?}")]
    InvalidState {
        state: ProgramState,
        operation: &'static str,
    },
}

impl ShaderError {
    /// The state a build ends up in after this error, if the error belongs to a build step.
    pub fn state(&self) -> Option<ProgramState> {
        match self {
            ShaderError::FileRead { .. } => Some(ProgramState::Unbuilt),
            ShaderError::Compile { .. } => Some(ProgramState::CompileFailed),
            ShaderError::Link { .. } => Some(ProgramState::LinkFailed),
            _ => None,
        }
    }
}

/// Drivers may hand back an empty info log for a failed stage.
fn diagnostic_or_default(log: String, what: &str) -> String {
    if log.trim().is_empty() {
        format!("{what} failed without a diagnostic from the driver")
    } else {
        log
    }
}

/// The subset of the graphics API that shader management needs.
///
/// Diagnostics are returned as strings. Uniform uploads apply to the currently bound program.
pub trait ShaderBackend {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + PartialEq + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    fn create_shader_object(&self, kind: ShaderKind) -> Result<Self::Shader, String>;
    /// Uploads the source and compiles it, returning the compile status.
    fn compile_shader_source(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_log(&self, shader: Self::Shader) -> String;
    fn delete_shader_object(&self, shader: Self::Shader);

    fn create_program_object(&self) -> Result<Self::Program, String>;
    fn attach_to_program(&self, program: Self::Program, shader: Self::Shader);
    fn detach_from_program(&self, program: Self::Program, shader: Self::Shader);
    /// Links the program, returning the link status.
    fn link_program_object(&self, program: Self::Program) -> bool;
    fn program_log(&self, program: Self::Program) -> String;
    fn delete_program_object(&self, program: Self::Program);
    fn bind_program(&self, program: Option<Self::Program>);
    /// The program currently in use, if any.
    fn bound_program(&self) -> Option<Self::Program>;

    fn find_uniform(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;
    fn set_uniform_i32(&self, location: &Self::UniformLocation, value: i32);
    fn set_uniform_f32(&self, location: &Self::UniformLocation, value: f32);
    fn set_uniform_vec2(&self, location: &Self::UniformLocation, value: Vec2);
    fn set_uniform_vec3(&self, location: &Self::UniformLocation, value: Vec3);
    fn set_uniform_vec4(&self, location: &Self::UniformLocation, value: Vec4);
    fn set_uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4);
    fn read_uniform_f32(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        out: &mut [f32],
    );
    fn read_uniform_i32(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        out: &mut [i32],
    );
}

impl ShaderBackend for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_shader_object(&self, kind: ShaderKind) -> Result<glow::Shader, String> {
        unsafe { self.create_shader(kind.gl_enum()) }
    }

    fn compile_shader_source(&self, shader: glow::Shader, source: &str) -> bool {
        unsafe {
            self.shader_source(shader, source);
            self.compile_shader(shader);
            self.get_shader_compile_status(shader)
        }
    }

    fn shader_log(&self, shader: glow::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader_object(&self, shader: glow::Shader) {
        unsafe { self.delete_shader(shader) }
    }

    fn create_program_object(&self) -> Result<glow::Program, String> {
        unsafe { self.create_program() }
    }

    fn attach_to_program(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { self.attach_shader(program, shader) }
    }

    fn detach_from_program(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { self.detach_shader(program, shader) }
    }

    fn link_program_object(&self, program: glow::Program) -> bool {
        unsafe {
            self.link_program(program);
            self.get_program_link_status(program)
        }
    }

    fn program_log(&self, program: glow::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn delete_program_object(&self, program: glow::Program) {
        unsafe { self.delete_program(program) }
    }

    fn bind_program(&self, program: Option<glow::Program>) {
        unsafe { self.use_program(program) }
    }

    fn bound_program(&self) -> Option<glow::Program> {
        let id = unsafe { self.get_parameter_i32(glow::CURRENT_PROGRAM) };
        NonZeroU32::new(id as u32).map(glow::NativeProgram)
    }

    fn find_uniform(&self, program: glow::Program, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn set_uniform_i32(&self, location: &glow::UniformLocation, value: i32) {
        unsafe { self.uniform_1_i32(Some(location), value) }
    }

    fn set_uniform_f32(&self, location: &glow::UniformLocation, value: f32) {
        unsafe { self.uniform_1_f32(Some(location), value) }
    }

    fn set_uniform_vec2(&self, location: &glow::UniformLocation, value: Vec2) {
        unsafe { self.uniform_2_f32(Some(location), value.x, value.y) }
    }

    fn set_uniform_vec3(&self, location: &glow::UniformLocation, value: Vec3) {
        unsafe { self.uniform_3_f32(Some(location), value.x, value.y, value.z) }
    }

    fn set_uniform_vec4(&self, location: &glow::UniformLocation, value: Vec4) {
        unsafe { self.uniform_4_f32(Some(location), value.x, value.y, value.z, value.w) }
    }

    fn set_uniform_mat4(&self, location: &glow::UniformLocation, value: &Mat4) {
        unsafe { self.uniform_matrix_4_f32_slice(Some(location), false, value.as_ref()) }
    }

    fn read_uniform_f32(
        &self,
        program: glow::Program,
        location: &glow::UniformLocation,
        out: &mut [f32],
    ) {
        unsafe { self.get_uniform_f32(program, location, out) }
    }

    fn read_uniform_i32(
        &self,
        program: glow::Program,
        location: &glow::UniformLocation,
        out: &mut [i32],
    ) {
        unsafe { self.get_uniform_i32(program, location, out) }
    }
}

/// Vertex and fragment source text read from disk.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    /// Reads both stages. Fails on the first file that cannot be read.
    pub fn from_files(
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        Ok(Self {
            vertex: read_source(vertex_path.as_ref())?,
            fragment: read_source(fragment_path.as_ref())?,
        })
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Represents an individual compiled shader. The GPU object is deleted on drop.
pub struct Shader<B: ShaderBackend = glow::Context> {
    gl: Arc<B>,
    id: B::Shader,
    kind: ShaderKind,
}

impl<B: ShaderBackend> Shader<B> {
    /// Compiles a new shader from the given source code.
    pub fn new(gl: &Arc<B>, kind: ShaderKind, source: &str) -> Result<Self, ShaderError> {
        let id = gl.create_shader_object(kind).map_err(ShaderError::Create)?;

        if !gl.compile_shader_source(id, source) {
            let log = gl.shader_log(id);
            gl.delete_shader_object(id);
            return Err(ShaderError::Compile {
                kind,
                log: diagnostic_or_default(log, "compilation"),
            });
        }

        Ok(Self {
            gl: Arc::clone(gl),
            id,
            kind,
        })
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }
}

impl<B: ShaderBackend> Drop for Shader<B> {
    fn drop(&mut self) {
        self.gl.delete_shader_object(self.id);
    }
}

/// Represents a value that can be uploaded to a uniform variable.
pub trait Uniform {
    /// Uploads the value to `location` of the currently bound program.
    fn set_uniform<B: ShaderBackend>(&self, gl: &B, location: &B::UniformLocation);
}

impl Uniform for bool {
    fn set_uniform<B: ShaderBackend>(&self, gl: &B, location: &B::UniformLocation) {
        gl.set_uniform_i32(location, *self as i32);
    }
}

impl Uniform for i32 {
    fn set_uniform<B: ShaderBackend>(&self, gl: &B, location: &B::UniformLocation) {
        gl.set_uniform_i32(location, *self);
    }
}

impl Uniform for f32 {
    fn set_uniform<B: ShaderBackend>(&self, gl: &B, location: &B::UniformLocation) {
        gl.set_uniform_f32(location, *self);
    }
}

impl Uniform for Vec2 {
    fn set_uniform<B: ShaderBackend>(&self, gl: &B, location: &B::UniformLocation) {
        gl.set_uniform_vec2(location, *self);
    }
}

impl Uniform for Vec3 {
    fn set_uniform<B: ShaderBackend>(&self, gl: &B, location: &B::UniformLocation) {
        gl.set_uniform_vec3(location, *self);
    }
}

impl Uniform for Vec4 {
    fn set_uniform<B: ShaderBackend>(&self, gl: &B, location: &B::UniformLocation) {
        gl.set_uniform_vec4(location, *self);
    }
}

impl Uniform for Mat4 {
    fn set_uniform<B: ShaderBackend>(&self, gl: &B, location: &B::UniformLocation) {
        gl.set_uniform_mat4(location, self);
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform<B: ShaderBackend>(&self, gl: &B, location: &B::UniformLocation) {
        (*self).set_uniform(gl, location);
    }
}

/// Compiles and links a [`ShaderProgram`] one step at a time, tracking [`ProgramState`].
pub struct ShaderProgramBuilder<B: ShaderBackend = glow::Context> {
    gl: Arc<B>,
    state: ProgramState,
    shaders: Vec<Shader<B>>,
}

impl<B: ShaderBackend> ShaderProgramBuilder<B> {
    pub fn new(gl: &Arc<B>) -> Self {
        Self {
            gl: Arc::clone(gl),
            state: ProgramState::Unbuilt,
            shaders: Vec::with_capacity(2),
        }
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    /// Compiles `source` as the given stage. Attaching a stage twice replaces the first one.
    pub fn attach(&mut self, kind: ShaderKind, source: &str) -> Result<&mut Self, ShaderError> {
        if !matches!(self.state, ProgramState::Unbuilt | ProgramState::Compiled) {
            return Err(ShaderError::InvalidState {
                state: self.state,
                operation: "attach a shader",
            });
        }

        self.state = ProgramState::Compiling;
        match Shader::new(&self.gl, kind, source) {
            Ok(shader) => {
                self.shaders.retain(|s| s.kind != kind);
                self.shaders.push(shader);
                self.state = ProgramState::Compiled;
                Ok(self)
            }
            Err(err) => {
                self.shaders.clear();
                self.state = ProgramState::CompileFailed;
                Err(err)
            }
        }
    }

    /// Links the attached stages. The intermediate shader objects are released either way.
    pub fn link(&mut self) -> Result<ShaderProgram<B>, ShaderError> {
        if self.state != ProgramState::Compiled {
            return Err(ShaderError::InvalidState {
                state: self.state,
                operation: "link",
            });
        }
        for kind in [ShaderKind::Vertex, ShaderKind::Fragment] {
            if !self.shaders.iter().any(|s| s.kind == kind) {
                return Err(ShaderError::MissingStage(kind));
            }
        }

        self.state = ProgramState::Linking;
        let shaders = std::mem::take(&mut self.shaders);
        let result = ShaderProgram::link(&self.gl, &shaders);
        drop(shaders);

        self.state = match result {
            Ok(_) => ProgramState::Ready,
            Err(_) => ProgramState::LinkFailed,
        };
        result
    }
}

/// Represents a linked OpenGL shader program.
pub struct ShaderProgram<B: ShaderBackend = glow::Context> {
    gl: Arc<B>,
    id: B::Program,
    locations: RefCell<HashMap<String, Option<B::UniformLocation>>>,
}

impl<B: ShaderBackend> ShaderProgram<B> {
    /// Reads, compiles and links a program from a vertex and a fragment source file.
    pub fn from_files(
        gl: &Arc<B>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let (vertex_path, fragment_path) = (vertex_path.as_ref(), fragment_path.as_ref());
        let source = ShaderSource::from_files(vertex_path, fragment_path)?;
        log::debug!(
            "Loaded shader sources {} and {}",
            vertex_path.display(),
            fragment_path.display()
        );
        Self::from_sources(gl, &source.vertex, &source.fragment)
    }

    /// Compiles and links a program from in-memory sources.
    pub fn from_sources(gl: &Arc<B>, vertex: &str, fragment: &str) -> Result<Self, ShaderError> {
        let mut builder = ShaderProgramBuilder::new(gl);
        builder
            .attach(ShaderKind::Vertex, vertex)?
            .attach(ShaderKind::Fragment, fragment)?;
        builder.link()
    }

    fn link(gl: &Arc<B>, shaders: &[Shader<B>]) -> Result<Self, ShaderError> {
        let program = gl.create_program_object().map_err(ShaderError::Create)?;

        for shader in shaders {
            gl.attach_to_program(program, shader.id);
        }

        let linked = gl.link_program_object(program);

        for shader in shaders {
            gl.detach_from_program(program, shader.id);
        }

        if !linked {
            let log = gl.program_log(program);
            gl.delete_program_object(program);
            return Err(ShaderError::Link {
                log: diagnostic_or_default(log, "linking"),
            });
        }

        Ok(Self {
            gl: Arc::clone(gl),
            id: program,
            locations: RefCell::new(HashMap::new()),
        })
    }

    /// Binds the shader program. When the returned guard is dropped, whatever program was bound
    /// before is bound again.
    pub fn use_program(&self) -> ActiveProgram<'_, B> {
        let previous = self.gl.bound_program();
        self.gl.bind_program(Some(self.id));
        ActiveProgram {
            program: self,
            previous,
        }
    }

    fn location(&self, name: &str) -> Option<B::UniformLocation> {
        let cached = self.locations.borrow().get(name).cloned();
        if let Some(location) = cached {
            return location;
        }

        let location = self.gl.find_uniform(self.id, name);
        if location.is_none() {
            log::debug!("Uniform `{name}` is not active in program {:?}", self.id);
        }
        self.locations
            .borrow_mut()
            .insert(name.to_owned(), location.clone());
        location
    }
}

impl<B: ShaderBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        self.gl.delete_program_object(self.id);
    }
}

/// A bound [`ShaderProgram`]. Uniforms can only be set through this guard.
///
/// Guards nest: uploads always reach the guard's own program, even while another guard is
/// holding a different program bound. Unknown uniform names are ignored, the same way the driver
/// ignores location `-1`.
pub struct ActiveProgram<'a, B: ShaderBackend = glow::Context> {
    program: &'a ShaderProgram<B>,
    previous: Option<B::Program>,
}

impl<B: ShaderBackend> ActiveProgram<'_, B> {
    /// Sets a uniform variable in the shader program.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        let Some(location) = self.program.location(name) else {
            return;
        };
        let gl = &*self.program.gl;
        let current = gl.bound_program();
        if current == Some(self.program.id) {
            value.set_uniform(gl, &location);
        } else {
            gl.bind_program(Some(self.program.id));
            value.set_uniform(gl, &location);
            gl.bind_program(current);
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, value);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    /// Reads a float uniform back from the driver.
    pub fn uniform_f32(&self, name: &str) -> Option<f32> {
        let location = self.program.location(name)?;
        let mut value = [0.0];
        self.program
            .gl
            .read_uniform_f32(self.program.id, &location, &mut value);
        Some(value[0])
    }

    /// Reads an integer (or boolean) uniform back from the driver.
    pub fn uniform_i32(&self, name: &str) -> Option<i32> {
        let location = self.program.location(name)?;
        let mut value = [0];
        self.program
            .gl
            .read_uniform_i32(self.program.id, &location, &mut value);
        Some(value[0])
    }
}

impl<B: ShaderBackend> Drop for ActiveProgram<'_, B> {
    fn drop(&mut self) {
        self.program.gl.bind_program(self.previous);
    }
}
