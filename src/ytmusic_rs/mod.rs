//! Minimal YouTube Music (InnerTube) API bindings.

pub mod auth;
pub mod client;
pub mod parse;
