//! A small OpenGL playground: two colored triangles or a blended textured quad,
//! drawn with glow on an SDL2 window and moved around with the keyboard.
//!
//! The reusable part is [`abs::ShaderProgram`], which loads, compiles and links shader
//! sources and reports every failure as a [`abs::ShaderError`].

pub mod abs;
pub mod config;
pub mod logger;
pub mod other;
pub mod scenes;
