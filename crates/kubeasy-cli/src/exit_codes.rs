//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - operation completed, all objectives passed
pub const SUCCESS: i32 = 0;

/// General error - bad input, cluster failure, bundle error
pub const ERROR: i32 = 1;

/// One or more objectives failed validation
pub const OBJECTIVES_FAILED: i32 = 2;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
