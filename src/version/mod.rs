//! Version normalization and tag validation.

pub mod parser;
pub mod validator;

pub use parser::{normalize, normalize_branch, DEFAULT_BRANCH_VERSION};
pub use validator::{branch_version, strip_release_prefix, validate_tag, NormalizedVersion};
