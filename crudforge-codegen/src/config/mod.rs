//! Configuration for crudforge-codegen

pub mod defaults;
mod settings;

pub use settings::*;
