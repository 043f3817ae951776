pub mod cli;
pub mod config;
pub mod core;
pub mod utils;

pub use crate::core::{get_filename, get_non_colliding_name, FilenameError, OutputPath, VideoMetadata};
pub use crate::utils::sanitize_filename;
