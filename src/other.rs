use std::collections::HashSet;

use glam::Vec2;
use sdl2::keyboard::Keycode;

/// The keys currently held down.
#[derive(Default)]
pub struct KeyboardState {
    pub down: HashSet<Keycode>,
}

impl KeyboardState {
    pub fn key_down(&mut self, keycode: Keycode) {
        self.down.insert(keycode);
    }

    pub fn key_up(&mut self, keycode: Keycode) {
        self.down.remove(&keycode);
    }

    pub fn is_down(&self, keycode: Keycode) -> bool {
        self.down.contains(&keycode)
    }

    /// `-1`, `0` or `1` depending on which of the two keys are held.
    pub fn axis(&self, negative: Keycode, positive: Keycode) -> f32 {
        self.is_down(positive) as i32 as f32 - self.is_down(negative) as i32 as f32
    }
}

/// Four keys that move something around the screen.
#[derive(Debug, Clone, Copy)]
pub struct MoveKeys {
    pub up: Keycode,
    pub down: Keycode,
    pub left: Keycode,
    pub right: Keycode,
}

impl MoveKeys {
    pub const WASD: Self = Self {
        up: Keycode::W,
        down: Keycode::S,
        left: Keycode::A,
        right: Keycode::D,
    };

    pub const ARROWS: Self = Self {
        up: Keycode::Up,
        down: Keycode::Down,
        left: Keycode::Left,
        right: Keycode::Right,
    };

    /// Unit-step direction of the held keys. Opposite keys cancel out.
    pub fn direction(&self, keyboard: &KeyboardState) -> Vec2 {
        Vec2::new(
            keyboard.axis(self.left, self.right),
            keyboard.axis(self.down, self.up),
        )
    }
}

/// Context provided to scenes during the update phase.
pub struct UpdateContext<'a> {
    pub keyboard: &'a KeyboardState,
    pub delta_time: f32,
}

impl<'a> UpdateContext<'a> {
    /// Creates a new `UpdateContext` from the given keyboard state and delta time.
    pub fn new(keyboard: &'a KeyboardState, delta_time: f32) -> Self {
        Self {
            keyboard,
            delta_time,
        }
    }
}
