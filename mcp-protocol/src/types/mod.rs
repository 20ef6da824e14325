// mcp-protocol/src/types/mod.rs
mod implementation;
pub mod resource;
pub mod tool;

pub use implementation::{ClientInfo, Implementation, ServerInfo};
