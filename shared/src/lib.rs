//! Wire types shared by the presence client and the relay server.

pub mod config;
pub mod frame;
pub mod protocol;
pub mod vec3;
