//! This module contains the thin wrappers around SDL2 and OpenGL,
//! including application setup, shader management, mesh handling and textures.

pub mod app;
pub mod mesh;
pub mod shader;
pub mod texture;

#[cfg(test)]
pub mod mock;

pub use app::*;
pub use mesh::*;
pub use shader::*;
pub use texture::*;
