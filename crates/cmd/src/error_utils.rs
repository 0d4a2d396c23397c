// Error mapping helpers shared by the commands

use anyhow::{Result, anyhow};

/// Extension trait for Results to provide standardized error mapping
pub trait ErrorContext<T> {
    /// Map error with a context message
    fn with_context_msg(self, msg: &str) -> Result<T>;

    /// Common error mapping for file operations
    fn file_context(self, operation: &str, path: &str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_context_msg(self, msg: &str) -> Result<T> {
        self.map_err(|e| anyhow!("{}: {}", msg, e))
    }

    fn file_context(self, operation: &str, path: &str) -> Result<T> {
        self.with_context_msg(&format!("Failed to {} {}", operation, path))
    }
}
