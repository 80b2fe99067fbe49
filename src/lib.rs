//! pdfwrap: convert HTML from URLs, files, streams or strings to PDF by driving an external renderer.

pub mod api;
pub mod cli;
pub mod config;
pub mod css;
pub mod error;
pub mod executor;
pub mod meta;
pub mod options;
pub mod pdfkit;
pub mod renderer;
pub mod source;

// Re-exports for CLI and consumers.
pub use api::{build_command, convert, from_file, from_reader, from_string, from_url};
pub use error::{PdfError, Result};
pub use executor::{PdfOutput, PDF_SIGNATURE};
pub use options::{normalize_options, NormalizedOptions, OptionValue, Options};
pub use pdfkit::{ConvertOptions, PdfKit};
pub use renderer::{Configuration, ConfigurationBuilder};
pub use source::{FileStream, Inputs, Source, SourceKind};
