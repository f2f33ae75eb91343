#[macro_use]
extern crate bitflags;

pub use bevy_math::{Mat4 as Matrix4, Vec3};

pub use self::align::*;

pub mod gpu;
mod align;
