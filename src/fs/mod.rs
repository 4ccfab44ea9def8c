//! Filesystem utilities for promptbatch.
//!
//! Project files and task outputs are written atomically so that an
//! interrupted save never leaves a truncated file behind.

pub mod atomic;

pub use atomic::{atomic_write, atomic_write_file, ensure_dir};
