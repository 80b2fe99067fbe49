//! One-call conversions. Each builds a [PdfKit] for the given source and runs it.

use crate::error::Result;
use crate::executor::PdfOutput;
use crate::pdfkit::{ConvertOptions, PdfKit};
use crate::renderer::Configuration;
use crate::source::{FileStream, Inputs, Source};
use std::path::Path;

/// Convert `source`, writing to `output` or returning the PDF bytes when `output` is `None`.
pub fn convert(
    source: Source,
    output: Option<&Path>,
    settings: &ConvertOptions,
    configuration: &Configuration,
) -> Result<PdfOutput> {
    PdfKit::new(source, configuration.clone(), settings).to_pdf(output)
}

/// The command [convert] would run, without running it.
pub fn build_command(
    source: Source,
    output: Option<&Path>,
    settings: &ConvertOptions,
    configuration: &Configuration,
) -> Result<Vec<String>> {
    PdfKit::new(source, configuration.clone(), settings).command(output)
}

/// Convert one URL or several URLs into a single PDF.
pub fn from_url(
    url: impl Into<Inputs>,
    output: Option<&Path>,
    settings: &ConvertOptions,
    configuration: &Configuration,
) -> Result<PdfOutput> {
    convert(Source::url(url), output, settings, configuration)
}

/// Convert one HTML file or several files. Missing files fail before the renderer starts.
pub fn from_file(
    path: impl Into<Inputs>,
    output: Option<&Path>,
    settings: &ConvertOptions,
    configuration: &Configuration,
) -> Result<PdfOutput> {
    convert(Source::file(path)?, output, settings, configuration)
}

/// Convert inline HTML or plain text.
pub fn from_string(
    html: impl Into<String>,
    output: Option<&Path>,
    settings: &ConvertOptions,
    configuration: &Configuration,
) -> Result<PdfOutput> {
    convert(Source::string(html), output, settings, configuration)
}

/// Convert an open stream; its contents are piped to the renderer.
pub fn from_reader(
    stream: FileStream,
    output: Option<&Path>,
    settings: &ConvertOptions,
    configuration: &Configuration,
) -> Result<PdfOutput> {
    convert(Source::stream(stream), output, settings, configuration)
}
