//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract: supervisors restart or give
//! up based on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Clean shutdown (stdin closed)                    |
//! | 1    | General error                                    |
//! | 2    | Usage error (bad flags, reported by clap)        |
//! | 3    | Configuration file missing, unreadable or invalid |
//! | 4    | Transport failure (bind error, stdio I/O error)  |

/// Success - transport ended cleanly.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Configuration could not be loaded or failed validation.
pub const EXIT_CONFIG: u8 = 3;

/// Listener could not bind, or the stdio stream failed.
pub const EXIT_TRANSPORT: u8 = 4;
