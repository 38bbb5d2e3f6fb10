//! Exit codes for the CLI
//!
//! `skylift submit` exits with the number of failed stores, so any non-zero
//! code below 255 may also be a failure count.

/// Success
pub const SUCCESS: i32 = 0;

/// General error, including configuration errors
pub const ERROR: i32 = 1;

/// Exit code for a submission run with `failed` failed stores
pub fn from_failures(failed: usize) -> i32 {
    i32::try_from(failed).unwrap_or(i32::MAX).min(255)
}
