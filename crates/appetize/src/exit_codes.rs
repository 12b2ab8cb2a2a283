//! Exit codes for the CLI

/// Success
pub const SUCCESS: i32 = 0;

/// Publish failed and `--strict` was given
pub const PUBLISH_FAILED: i32 = 3;

/// User cancelled
pub const CANCELLED: i32 = 130;
