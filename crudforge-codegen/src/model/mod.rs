//! Canonical type model shared by every adapter and generator

mod entity;
mod gen_file;
mod operation;
mod type_meta;

pub use entity::*;
pub use gen_file::*;
pub use operation::*;
pub use type_meta::*;
