//! # Shared
//! Process plumbing shared by the backup orchestrator's library, binary and tests.
//!

#![warn(missing_docs)]

mod failure;
mod logger;

pub use failure::{Failure, log_and_panic};
pub use logger::{LoggerError, init_logger};
