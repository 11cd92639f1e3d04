use std::sync::Arc;

use glam::Vec3;

use super::{Scene, SceneError, Shape};
use crate::{
    abs::{ColorVertex, Mesh, ShaderProgram},
    config::Config,
    other::{MoveKeys, UpdateContext},
};

pub type Triangle = Shape<ColorVertex, 3>;

/// Horizontal shift applied by the vertex shader to each triangle.
const FIRST_OFFSET: f32 = -0.1;
const SECOND_OFFSET: f32 = 0.1;

const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const BLUE: Vec3 = Vec3::new(0.0, 0.0, 0.8);

/// Green triangle on the left half, pointing right.
pub const FIRST_TRIANGLE: Triangle = Shape::new([
    ColorVertex::new(Vec3::new(-0.8, 0.8, 0.0), GREEN),
    ColorVertex::new(Vec3::new(-0.8, -0.8, 0.0), GREEN),
    ColorVertex::new(Vec3::new(0.0, 0.0, 0.0), GREEN),
]);

/// Blue triangle on the right half, pointing left.
pub const SECOND_TRIANGLE: Triangle = Shape::new([
    ColorVertex::new(Vec3::new(0.8, 0.8, 0.0), BLUE),
    ColorVertex::new(Vec3::new(0.8, -0.8, 0.0), BLUE),
    ColorVertex::new(Vec3::new(0.0, 0.0, 0.0), BLUE),
]);

struct DrawnTriangle {
    shape: Triangle,
    mesh: Mesh,
    keys: MoveKeys,
    offset: f32,
    dirty: bool,
}

impl DrawnTriangle {
    fn new(
        gl: &Arc<glow::Context>,
        shape: Triangle,
        keys: MoveKeys,
        offset: f32,
    ) -> Result<Self, SceneError> {
        let mesh = Mesh::new(gl, &shape.vertices, &[0, 1, 2], glow::TRIANGLES)
            .map_err(SceneError::Mesh)?;
        Ok(Self {
            shape,
            mesh,
            keys,
            offset,
            dirty: false,
        })
    }
}

/// Two triangles sharing one program, moved by WASD and the arrow keys.
pub struct TrianglesScene {
    program: ShaderProgram,
    triangles: [DrawnTriangle; 2],
    move_speed: f32,
}

impl TrianglesScene {
    pub fn new(gl: &Arc<glow::Context>, config: &Config) -> Result<Self, SceneError> {
        let paths = &config.shaders.triangles;
        let program = ShaderProgram::from_files(gl, &paths.vertex, &paths.fragment)?;

        Ok(Self {
            program,
            triangles: [
                DrawnTriangle::new(gl, FIRST_TRIANGLE, MoveKeys::WASD, FIRST_OFFSET)?,
                DrawnTriangle::new(gl, SECOND_TRIANGLE, MoveKeys::ARROWS, SECOND_OFFSET)?,
            ],
            move_speed: config.move_speed,
        })
    }
}

impl Scene for TrianglesScene {
    fn update(&mut self, ctx: &UpdateContext) {
        for triangle in &mut self.triangles {
            if triangle
                .shape
                .follow_keys(&triangle.keys, ctx, self.move_speed)
            {
                triangle.dirty = true;
            }
        }
    }

    fn render(&mut self) {
        for triangle in &mut self.triangles {
            if triangle.dirty {
                triangle.mesh.update_vertices(&triangle.shape.vertices);
                triangle.dirty = false;
            }
        }

        let active = self.program.use_program();
        for triangle in &self.triangles {
            active.set_float("offset", triangle.offset);
            triangle.mesh.draw();
        }
    }
}
