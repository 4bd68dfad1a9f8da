//! Command-line interface.

pub mod args;
pub mod render;
pub mod serve;

pub use args::{Cli, Commands, RenderArgs, ServeArgs};
