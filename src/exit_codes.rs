//! Exit code constants for the promptbatch CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid project state)
//! - 2: Variable resolution failure (circular or too-deep references)
//! - 3: Generation failure (network, auth, quota, empty response)
//! - 4: Persistence failure (project, output, or log file I/O)
//! - 130: Run aborted by a second Ctrl-C

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or an invalid project state.
pub const USER_ERROR: i32 = 1;

/// A placeholder could not be resolved.
pub const RESOLVE_FAILURE: i32 = 2;

/// The generation API call failed.
pub const GENERATION_FAILURE: i32 = 3;

/// Reading or writing a file failed.
pub const PERSISTENCE_FAILURE: i32 = 4;

/// A run was aborted by a second interrupt (128 + SIGINT).
pub const INTERRUPTED: i32 = 130;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            RESOLVE_FAILURE,
            GENERATION_FAILURE,
            PERSISTENCE_FAILURE,
            INTERRUPTED,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn success_is_zero() {
        assert_eq!(SUCCESS, 0);
    }
}
