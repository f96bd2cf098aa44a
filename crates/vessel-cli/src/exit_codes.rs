//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - invalid schema or values document
pub const VALIDATION_ERROR: i32 = 2;

/// Template error - an item template failed to render
pub const TEMPLATE_ERROR: i32 = 3;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Dependency error - config items form a cycle or reference an unknown item
pub const DEPENDENCY_ERROR: i32 = 6;

/// Store error - the redactor store could not be read or written
pub const STORE_ERROR: i32 = 7;
