//! Process exit codes of the binary.

use crate::config::ConfigValidationError;
use crate::error_handling::MapError;

/// The map was written.
pub const EXIT_SUCCESS: i32 = 0;
/// Unreadable input, unusable database, tile abort or unwritable output.
pub const EXIT_FAILURE: i32 = 1;
/// Invalid command-line usage or configuration.
pub const EXIT_USAGE: i32 = 2;

/// Exit code for a failed run: [`EXIT_USAGE`] for configuration errors
/// anywhere in the chain, [`EXIT_FAILURE`] otherwise.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    let is_usage = error.chain().any(|cause| {
        matches!(cause.downcast_ref::<MapError>(), Some(MapError::Config(_)))
            || cause.is::<ConfigValidationError>()
    });
    if is_usage {
        EXIT_USAGE
    } else {
        EXIT_FAILURE
    }
}
