//! Compiles XML instruction-set descriptions into decoder-ready tables.

pub mod isa;
pub mod loader;

pub use isa::{CompiledIsa, IsaError, LoadOptions};
pub use loader::xml::IsaLoader;
