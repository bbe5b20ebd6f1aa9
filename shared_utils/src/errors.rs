use crate::error_handler::ErrorCategory;
use crate::tool_resolver::ToolNotFound;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("❌ Source directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error(transparent)]
    ToolNotFound(#[from] ToolNotFound),

    #[error("❌ Decoder is no longer available: {} ({source})", .path.display())]
    DecoderUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    UnsafeDirectory(String),

    #[error("❌ Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("❌ Failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("❌ {count} file(s) failed to convert and strict mode is enabled")]
    FailedJobs { count: usize },

    #[error("🛑 Run cancelled; {remaining} job(s) were not started")]
    Cancelled { remaining: usize },
}

impl ConvertError {
    /// Every variant aborts the run; per-file failures never become a
    /// `ConvertError` unless strict mode escalates them.
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Fatal
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_resource() {
        let err = ConvertError::SourceMissing(PathBuf::from("/game/Assets_1_Audio_Streams"));
        assert!(err.to_string().contains("/game/Assets_1_Audio_Streams"));

        let err = ConvertError::DecoderUnavailable {
            path: PathBuf::from("/opt/vgmstream-cli"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/opt/vgmstream-cli"));
        assert_eq!(err.category(), ErrorCategory::Fatal);
    }

    #[test]
    fn test_tool_not_found_is_transparent() {
        let err: ConvertError = ToolNotFound {
            reference: "vgmstream-cli".to_string(),
            checked: vec!["'vgmstream-cli' on PATH".to_string()],
        }
        .into();
        assert!(err.to_string().contains("vgmstream-cli"));
        assert!(err.to_string().contains("on PATH"));
    }
}
