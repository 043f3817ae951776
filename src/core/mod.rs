pub mod error;
pub mod format;
pub mod metadata;
pub mod path;
pub mod template;

pub use error::{FilenameError, FormatError};
pub use metadata::VideoMetadata;
pub use path::{get_non_colliding_name, guess_vod_extension, split_path, OutputPath};
pub use template::{expand_custom_tokens, get_filename, substitute_tokens, CustomKind};
