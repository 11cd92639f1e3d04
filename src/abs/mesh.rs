//! Mesh management module.
//!
//! This module defines the [`Mesh`] struct for managing mesh data on the GPU side.
//! Vertices should implement the [`Vertex`] trait, which describes their interleaved layout.

use std::{mem::offset_of, sync::Arc};

use glam::{Vec2, Vec3};
use glow::HasContext;

/// Trait that defines the necessary methods for a vertex.
pub trait Vertex: Copy {
    /// Sets up the vertex attribute pointers for the vertex.
    fn vertex_attribs(gl: &glow::Context);

    /// Returns the position of the vertex.
    fn position(&self) -> Vec3;

    /// Overwrites the position of the vertex.
    fn set_position(&mut self, position: Vec3);
}

/// Configures a float attribute at `location` that is `components` wide, `offset` bytes into `V`.
unsafe fn float_attrib<V>(gl: &glow::Context, location: u32, components: i32, offset: usize) {
    unsafe {
        gl.vertex_attrib_pointer_f32(
            location,
            components,
            glow::FLOAT,
            false,
            std::mem::size_of::<V>() as i32,
            offset as i32,
        );
        gl.enable_vertex_attrib_array(location);
    }
}

/// A vertex with a position and a color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorVertex {
    pub position: Vec3,
    pub color: Vec3,
}

impl ColorVertex {
    pub const fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }
}

impl Vertex for ColorVertex {
    fn vertex_attribs(gl: &glow::Context) {
        unsafe {
            float_attrib::<Self>(gl, 0, 3, offset_of!(Self, position));
            float_attrib::<Self>(gl, 1, 3, offset_of!(Self, color));
        }
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

/// A vertex with a position, a color and texture coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedVertex {
    pub position: Vec3,
    pub color: Vec3,
    pub tex_coords: Vec2,
}

impl TexturedVertex {
    pub const fn new(position: Vec3, color: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            color,
            tex_coords,
        }
    }
}

impl Vertex for TexturedVertex {
    fn vertex_attribs(gl: &glow::Context) {
        unsafe {
            float_attrib::<Self>(gl, 0, 3, offset_of!(Self, position));
            float_attrib::<Self>(gl, 1, 3, offset_of!(Self, color));
            float_attrib::<Self>(gl, 2, 2, offset_of!(Self, tex_coords));
        }
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

fn as_bytes<T>(data: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, std::mem::size_of_val(data)) }
}

/// Represents a mesh stored on the GPU side.
pub struct Mesh {
    gl: Arc<glow::Context>,
    draw_mode: u32,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    index_count: usize,
}

impl Mesh {
    /// Creates a new mesh from the given vertex and index data.
    pub fn new<V: Vertex>(
        gl: &Arc<glow::Context>,
        vertices: &[V],
        indices: &[u32],
        draw_mode: u32,
    ) -> Result<Self, String> {
        unsafe {
            let vao = gl.create_vertex_array()?;
            let vbo = gl.create_buffer().inspect_err(|_| gl.delete_vertex_array(vao))?;
            let ebo = gl.create_buffer().inspect_err(|_| {
                gl.delete_buffer(vbo);
                gl.delete_vertex_array(vao);
            })?;

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, as_bytes(vertices), glow::DYNAMIC_DRAW);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                as_bytes(indices),
                glow::STATIC_DRAW,
            );

            V::vertex_attribs(gl);

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

            Ok(Self {
                gl: Arc::clone(gl),
                draw_mode,
                vao,
                vbo,
                ebo,
                index_count: indices.len(),
            })
        }
    }

    /// Re-uploads the vertex data. The vertex count and layout must not change.
    pub fn update_vertices<V: Vertex>(&mut self, vertices: &[V]) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl
                .buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, as_bytes(vertices));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    /// Draws the mesh. The vertex array is bound only for the duration of the call.
    pub fn draw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.draw_elements(
                self.draw_mode,
                self.index_count as i32,
                glow::UNSIGNED_INT,
                0,
            );
            self.gl.bind_vertex_array(None);
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_buffer(self.ebo);
            self.gl.delete_vertex_array(self.vao);
        }
    }
}
