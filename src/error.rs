//! Error type shared by source handling, CSS injection, renderer discovery and conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or running a conversion.
///
/// Construction-time variants (`InputNotFound`, `ImproperSource`, `Configuration`) are returned
/// before any process is spawned. `Conversion` and `Process` come from the renderer run itself.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("{0}")]
    ImproperSource(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{message}")]
    Conversion { message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run renderer {program}: {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PdfError>;

impl PdfError {
    /// Conversion failure naming the command that was run.
    pub(crate) fn command_failed(args: &[String]) -> Self {
        PdfError::Conversion {
            message: format!(
                "Command failed: {}\nCheck renderer output without the 'quiet' option.",
                args.join(" ")
            ),
        }
    }
}
