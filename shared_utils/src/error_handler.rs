//! Error Handler Module
//!
//! ## Error categories
//! - Recoverable: the item is counted as failed, the batch continues
//! - Fatal: the run stops and the process exits non-zero
//! - Optional: a best-effort side step failed; logged as a warning only
//!
//! ## Reporting
//! - `handle_error()`: log an item-level error according to its category
//! - `report_error()`: print a fatal error with its full cause chain
//! - `install_panic_handler()`: log panics before the default hook runs

use std::fmt;
use std::panic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Recoverable,
    Fatal,
    Optional,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Recoverable => write!(f, "RECOVERABLE"),
            ErrorCategory::Fatal => write!(f, "FATAL"),
            ErrorCategory::Optional => write!(f, "OPTIONAL"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ErrorAction {
    Continue,
    Abort,
}

/// Logs `error` for `context` (usually the affected path) and says whether
/// the caller should keep going.
pub fn handle_error(category: ErrorCategory, context: &str, error: &dyn fmt::Display) -> ErrorAction {
    match category {
        ErrorCategory::Recoverable => {
            tracing::error!(category = %category, "❌ {}: {}", context, error);
            ErrorAction::Continue
        }
        ErrorCategory::Fatal => {
            tracing::error!(category = %category, "❌ {}: {}", context, error);
            ErrorAction::Abort
        }
        ErrorCategory::Optional => {
            tracing::warn!(category = %category, "⚠️ {}: {}", context, error);
            ErrorAction::Continue
        }
    }
}

pub fn report_error<E: std::error::Error + ?Sized>(error: &E) {
    eprintln!("🔥 ERROR: {}", error);

    let mut source = error.source();
    let mut level = 1;
    while let Some(err) = source {
        eprintln!("   {}. Caused by: {}", level, err);
        tracing::error!("  Caused by (level {}): {}", level, err);
        source = err.source();
        level += 1;
    }

    tracing::error!("Error occurred: {}", error);
}

pub fn install_panic_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "Unknown location".to_string());

        tracing::error!("PANIC: {} at {}", message, location);

        default_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_category_actions() {
        let error = io::Error::other("decoder exited with code 1");
        let cases = [
            (ErrorCategory::Recoverable, ErrorAction::Continue),
            (ErrorCategory::Fatal, ErrorAction::Abort),
            (ErrorCategory::Optional, ErrorAction::Continue),
        ];
        for (category, expected) in cases {
            assert_eq!(handle_error(category, "/src/a.snu", &error), expected);
        }
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Recoverable.to_string(), "RECOVERABLE");
        assert_eq!(ErrorCategory::Fatal.to_string(), "FATAL");
        assert_eq!(ErrorCategory::Optional.to_string(), "OPTIONAL");
    }

    #[test]
    fn test_report_error_walks_chain() {
        let inner = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let outer = io::Error::other(inner);
        report_error(&outer);
    }
}
