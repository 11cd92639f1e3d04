use std::sync::Arc;

use glam::{Vec2, Vec3};
use sdl2::keyboard::Keycode;

use super::{Scene, SceneError, Shape};
use crate::{
    abs::{Mesh, ShaderProgram, Texture, TexturedVertex},
    config::Config,
    other::{MoveKeys, UpdateContext},
};

pub type Quad = Shape<TexturedVertex, 4>;

pub const QUAD: Quad = Shape::new([
    TexturedVertex::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec2::new(1.0, 1.0)),
    TexturedVertex::new(Vec3::new(0.5, -0.5, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec2::new(1.0, 0.0)),
    TexturedVertex::new(Vec3::new(-0.5, -0.5, 0.0), Vec3::new(0.0, 0.0, 1.0), Vec2::new(0.0, 0.0)),
    TexturedVertex::new(Vec3::new(-0.5, 0.5, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec2::new(0.0, 1.0)),
]);

const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

const INITIAL_MIX: f32 = 0.2;

/// Moves `mix` towards `direction` at `speed` per second, staying within `[0, 1]`.
fn adjust_mix(mix: f32, direction: f32, speed: f32, delta_time: f32) -> f32 {
    (mix + direction * speed * delta_time).clamp(0.0, 1.0)
}

/// A quad blending two textures. WASD moves it, Q and E shift the blend.
pub struct TexturedScene {
    program: ShaderProgram,
    textures: [Texture; 2],
    quad: Quad,
    mesh: Mesh,
    dirty: bool,
    mix: f32,
    move_speed: f32,
    mix_speed: f32,
}

impl TexturedScene {
    pub fn new(gl: &Arc<glow::Context>, config: &Config) -> Result<Self, SceneError> {
        let paths = &config.shaders.textured;
        let program = ShaderProgram::from_files(gl, &paths.vertex, &paths.fragment)?;
        let textures = [
            Texture::from_file(gl, &config.textures.first)?,
            Texture::from_file(gl, &config.textures.second)?,
        ];
        let mesh = Mesh::new(gl, &QUAD.vertices, &QUAD_INDICES, glow::TRIANGLES)
            .map_err(SceneError::Mesh)?;

        {
            let active = program.use_program();
            active.set_int("texture1", 0);
            active.set_int("texture2", 1);
        }

        Ok(Self {
            program,
            textures,
            quad: QUAD,
            mesh,
            dirty: false,
            mix: INITIAL_MIX,
            move_speed: config.move_speed,
            mix_speed: config.mix_speed,
        })
    }
}

impl Scene for TexturedScene {
    fn update(&mut self, ctx: &UpdateContext) {
        if self.quad.follow_keys(&MoveKeys::WASD, ctx, self.move_speed) {
            self.dirty = true;
        }
        let direction = ctx.keyboard.axis(Keycode::Q, Keycode::E);
        self.mix = adjust_mix(self.mix, direction, self.mix_speed, ctx.delta_time);
    }

    fn render(&mut self) {
        if self.dirty {
            self.mesh.update_vertices(&self.quad.vertices);
            self.dirty = false;
        }

        for (unit, texture) in self.textures.iter().enumerate() {
            texture.bind(unit as u32);
        }

        let active = self.program.use_program();
        active.set_float("mixValue", self.mix);
        self.mesh.draw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_clamped() {
        assert_eq!(adjust_mix(0.9, 1.0, 1.0, 0.5), 1.0);
        assert_eq!(adjust_mix(0.1, -1.0, 1.0, 0.5), 0.0);
        assert_eq!(adjust_mix(0.5, 0.0, 1.0, 0.5), 0.5);
        assert_eq!(adjust_mix(0.25, 1.0, 0.5, 0.5), 0.5);
    }

    #[test]
    fn quad_indices_cover_two_triangles() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD.vertices.len()));
    }

    #[test]
    fn translating_the_quad_keeps_texture_coordinates() {
        let mut quad = QUAD;
        quad.translate(0.25, 0.0);
        for (moved, original) in quad.vertices.iter().zip(QUAD.vertices.iter()) {
            assert_eq!(moved.tex_coords, original.tex_coords);
            assert_eq!(moved.position.x, original.position.x + 0.25);
        }
    }
}
