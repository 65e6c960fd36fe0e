//! Data models for the transfer client
//!
//! Files, their access lists and the per-upload outcome reported back to the
//! interface layer.

mod access;
mod file;
mod upload;

pub use access::*;
pub use file::*;
pub use upload::*;
