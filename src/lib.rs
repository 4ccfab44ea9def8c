//! Promptbatch: batch prompt templating and execution.
//!
//! A project holds named variables, an ordered list of prompt tasks, and run
//! settings. Any text may reference a variable as `{NAME}`; references are
//! expanded recursively with cycle detection. A run sends each enabled
//! task's resolved prompt to a generative model and writes one output file
//! per task.
//!
//! - [`resolve`]: placeholder expansion
//! - [`project`]: project model, mutations, and persistence
//! - [`executor`]: sequential run loop, events, and stop control
//! - [`generate`]: generation API boundary and Gemini client
//! - [`run_log`]: per-run log files

pub mod error;
pub mod executor;
pub mod exit_codes;
pub mod fs;
pub mod generate;
pub mod project;
pub mod resolve;
pub mod run_log;
