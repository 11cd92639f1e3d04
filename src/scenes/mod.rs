//! Module providing the `Scene` trait and both scene implementations.
//!
//! A scene owns its geometry on the CPU side together with the GPU objects used to draw it.
//! Geometry is only ever moved through [`Shape::translate`].

use std::sync::Arc;

use glam::Vec2;

use crate::{
    abs::{ShaderError, TextureError, Vertex},
    config::Config,
    other::{MoveKeys, UpdateContext},
};

pub mod textured;
pub mod triangles;

/// Which scene to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// Two colored triangles, one per set of movement keys.
    Triangles,
    /// A quad blending two textures.
    Textured,
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error("failed to create mesh: {0}")]
    Mesh(String),
}

/// The Scene trait defines the common interface for all scenes.
pub trait Scene {
    /// Updates the scene state from input.
    fn update(&mut self, ctx: &UpdateContext);

    /// Renders the scene.
    fn render(&mut self);
}

/// Builds the scene for `variant`.
pub fn create(
    variant: Variant,
    gl: &Arc<glow::Context>,
    config: &Config,
) -> Result<Box<dyn Scene>, SceneError> {
    Ok(match variant {
        Variant::Triangles => Box::new(triangles::TrianglesScene::new(gl, config)?),
        Variant::Textured => Box::new(textured::TexturedScene::new(gl, config)?),
    })
}

/// A fixed set of vertices owned by a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape<V: Vertex, const N: usize> {
    pub vertices: [V; N],
}

impl<V: Vertex, const N: usize> Shape<V, N> {
    pub const fn new(vertices: [V; N]) -> Self {
        Self { vertices }
    }

    /// Moves every vertex position by `(dx, dy)`. Other attributes are left alone.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        for vertex in &mut self.vertices {
            let position = vertex.position();
            vertex.set_position(position + glam::Vec3::new(dx, dy, 0.0));
        }
    }

    /// Moves the shape according to the held `keys`. Returns whether it moved.
    pub fn follow_keys(&mut self, keys: &MoveKeys, ctx: &UpdateContext, speed: f32) -> bool {
        let step = keys.direction(ctx.keyboard) * speed * ctx.delta_time;
        if step == Vec2::ZERO {
            return false;
        }
        self.translate(step.x, step.y);
        true
    }
}
