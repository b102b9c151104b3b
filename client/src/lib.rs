//! Presence client library.
//!
//! Everything a shared-space client needs short of rendering: the wire
//! session, the remote entity registry, and per-frame pointer interaction.

pub mod client;
pub mod config;
pub mod connection;
pub mod grab;
pub mod input;
pub mod keyboard;
pub mod layout;
pub mod links;
pub mod menu;
pub mod pointer;
pub mod registry;
pub mod session;
pub mod surface;
pub mod url_bar;
