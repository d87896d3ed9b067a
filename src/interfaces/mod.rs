//! Outer adapters: the REST backend client and the terminal host surface.

pub mod http;
pub mod terminal;
