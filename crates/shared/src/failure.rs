//! Failure handling for the start-up path of a binary, where there is nobody to return an
//! error to.
//!

use core::fmt::Display;

use tracing::error;

/// Log `message` and `error`, then panic with the same text.
pub fn log_and_panic<E: Display>(error: E, message: &str) -> ! {
    error!("{message}: {error}");

    panic!("{message}: {error}");
}

/// Extension trait for results whose error can only be reported.
pub trait Failure<T> {
    /// Log the error and panic.
    fn or_log_and_panic(self, message: &str) -> T;

    /// Log the error and carry on without the value.
    fn or_log(self, message: &str) -> Option<T>;
}

impl<T, E: Display> Failure<T> for Result<T, E> {
    fn or_log_and_panic(self, message: &str) -> T {
        match self {
            Ok(value) => value,
            Err(error) => log_and_panic(error, message),
        }
    }

    fn or_log(self, message: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                error!("{message}: {error}");
                None
            }
        }
    }
}
