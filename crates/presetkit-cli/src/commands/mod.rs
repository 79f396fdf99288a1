//! CLI command implementations.

pub mod codegen;
pub mod common;
pub mod extract;
pub mod inspect;
pub mod run;
pub mod to_binary;
pub mod to_json;
