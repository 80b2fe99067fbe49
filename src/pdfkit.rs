//! Command assembly for one conversion: global options, toc/cover segments, input, output.

use crate::css::inject_css;
use crate::error::{PdfError, Result};
use crate::executor::{self, PdfOutput};
use crate::meta::find_options_in_meta;
use crate::options::{normalize_options, NormalizedOptions, Options};
use crate::renderer::Configuration;
use crate::source::Source;
use std::path::{Path, PathBuf};

/// Token telling the renderer to read input from stdin or write output to stdout.
pub const STDIO_MARKER: &str = "-";

/// Per-conversion settings besides the source itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    /// Global and page options for the renderer.
    pub options: Options,
    /// Table-of-contents options. `Some` emits a `toc` segment even when empty.
    pub toc: Option<Options>,
    /// URL or file name of the cover page.
    pub cover: Option<String>,
    /// Emit the cover segment before the toc segment.
    pub cover_first: bool,
    /// Stylesheets injected into the document before rendering.
    pub css: Vec<PathBuf>,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn toc(mut self, toc: Options) -> Self {
        self.toc = Some(toc);
        self
    }

    pub fn cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn cover_first(mut self, cover_first: bool) -> Self {
        self.cover_first = cover_first;
        self
    }

    pub fn css(mut self, path: impl Into<PathBuf>) -> Self {
        self.css.push(path.into());
        self
    }
}

/// One conversion request: source, normalized options and document layout.
#[derive(Debug)]
pub struct PdfKit {
    source: Source,
    configuration: Configuration,
    options: NormalizedOptions,
    toc: Option<NormalizedOptions>,
    cover: Option<String>,
    cover_first: bool,
    css: Vec<PathBuf>,
}

impl PdfKit {
    /// Inline-string sources contribute meta tag options as defaults under `settings.options`.
    pub fn new(source: Source, configuration: Configuration, settings: &ConvertOptions) -> Self {
        let options = match &source {
            Source::InlineString(html) => {
                let defaults = find_options_in_meta(html, configuration.meta_tag_prefix());
                Options::merge(&defaults, &settings.options)
            }
            _ => settings.options.clone(),
        };
        PdfKit {
            source,
            configuration,
            options: normalize_options(&options),
            toc: settings.toc.as_ref().map(normalize_options),
            cover: settings.cover.clone().filter(|c| !c.is_empty()),
            cover_first: settings.cover_first,
            css: settings.css.clone(),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn options(&self) -> &NormalizedOptions {
        &self.options
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Build the renderer command.
    ///
    /// Pending stylesheets are injected first; the injected document replaces the source, so
    /// later calls do not inject again. On failure the source is left as it was.
    pub fn command(&mut self, output: Option<&Path>) -> Result<Vec<String>> {
        if !self.css.is_empty() {
            self.source = inject_css(&self.source, &self.css)?;
            self.css.clear();
        }

        let mut args = vec![self.configuration.renderer().to_string_lossy().into_owned()];
        args.extend(self.options.tokens());

        let toc = self.toc.as_ref().map(|toc| {
            let mut segment = vec!["toc".to_string()];
            segment.extend(toc.tokens());
            segment
        });
        let cover = self
            .cover
            .as_ref()
            .map(|cover| vec!["cover".to_string(), cover.clone()]);
        let segments = if self.cover_first {
            [cover, toc]
        } else {
            [toc, cover]
        };
        args.extend(segments.into_iter().flatten().flatten());

        args.extend(self.source.tokens());

        match output.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => args.push(path.to_string_lossy().into_owned()),
            None => args.push(STDIO_MARKER.to_string()),
        }
        Ok(args)
    }

    /// Bytes written to the renderer's stdin: the inline document or the drained stream.
    /// URL and path sources are read by the renderer itself.
    pub fn stdin_payload(&mut self) -> Result<Option<Vec<u8>>> {
        match &mut self.source {
            // A file source with stylesheets is already inline text at this point.
            Source::InlineString(html) => Ok(Some(html.clone().into_bytes())),
            Source::FileStream(stream) => {
                let name = stream.name().unwrap_or("<stream>").to_string();
                let bytes = stream.read_all().map_err(|e| PdfError::Io {
                    path: PathBuf::from(name),
                    source: e,
                })?;
                Ok(Some(bytes))
            }
            Source::Url(_) | Source::FilePath(_) => Ok(None),
        }
    }

    /// Run the renderer. With `output` the file is checked for the PDF signature; without it
    /// the PDF bytes captured from stdout are returned.
    pub fn to_pdf(&mut self, output: Option<&Path>) -> Result<PdfOutput> {
        let args = self.command(output)?;
        let input = self.stdin_payload()?;
        let output = output.filter(|p| !p.as_os_str().is_empty());
        executor::run(&self.configuration, &args, input.as_deref(), output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{NormalizedValue, OptionValue};
    use crate::source::FileStream;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn configuration(fake: &NamedTempFile) -> Result<Configuration> {
        Configuration::builder().renderer(fake.path()).build()
    }

    fn page_options() -> Options {
        Options::new()
            .with("page-size", "Letter")
            .with("margin-top", "0.75in")
            .with("margin-right", "0.75in")
            .with("margin-bottom", "0.75in")
            .with("margin-left", "0.75in")
            .with("encoding", "UTF-8")
    }

    fn index_of(command: &[String], token: &str) -> usize {
        command
            .iter()
            .position(|t| t == token)
            .unwrap_or_else(|| panic!("{} not in {:?}", token, command))
    }

    #[test]
    fn command_starts_with_renderer() -> TestResult {
        let fake = NamedTempFile::new()?;
        let settings = ConvertOptions::new().options(
            Options::new()
                .with("page-size", "Letter")
                .with("toc-l1-font-size", 12),
        );
        let mut kit = PdfKit::new(Source::string("html"), configuration(&fake)?, &settings);
        let command = kit.command(None)?;
        assert_eq!(command[0], fake.path().to_string_lossy());
        assert_eq!(command[index_of(&command, "--page-size") + 1], "Letter");
        assert_eq!(command[index_of(&command, "--toc-l1-font-size") + 1], "12");
        Ok(())
    }

    #[test]
    fn repeated_custom_header() -> TestResult {
        let fake = NamedTempFile::new()?;
        let settings = ConvertOptions::new().options(
            Options::new().with("custom-header", vec![("Accept-Encoding", "gzip")]),
        );
        let mut kit = PdfKit::new(Source::string("html"), configuration(&fake)?, &settings);
        let command = kit.command(None)?;
        let idx = index_of(&command, "--custom-header");
        assert_eq!(command[idx + 1], "Accept-Encoding");
        assert_eq!(command[idx + 2], "gzip");
        Ok(())
    }

    #[test]
    fn empty_pair_value_keeps_its_slot() -> TestResult {
        let fake = NamedTempFile::new()?;
        let settings = ConvertOptions::new()
            .options(Options::new().with("cookie", vec![("a", ""), ("b", "2")]));
        let mut kit = PdfKit::new(Source::url("http://x"), configuration(&fake)?, &settings);
        let command = kit.command(None)?;
        assert_eq!(
            command[1..],
            ["--cookie", "a", "", "--cookie", "b", "2", "http://x", "-"]
        );
        Ok(())
    }

    #[test]
    fn stdin_and_stdout_markers() -> TestResult {
        let fake = NamedTempFile::new()?;
        let mut kit = PdfKit::new(Source::string("html"), configuration(&fake)?, &ConvertOptions::new());
        assert_eq!(kit.command(None)?[1..], ["-", "-"]);
        assert_eq!(
            kit.command(Some(Path::new("/test/test2/out.pdf")))?.last().map(String::as_str),
            Some("/test/test2/out.pdf")
        );
        Ok(())
    }

    #[test]
    fn url_and_path_sources_are_literal() -> TestResult {
        let fake = NamedTempFile::new()?;
        let html = NamedTempFile::new()?;
        let path = html.path().to_string_lossy().into_owned();

        let mut kit = PdfKit::new(Source::url("http://ya.ru"), configuration(&fake)?, &ConvertOptions::new());
        assert_eq!(kit.command(None)?[1..], ["http://ya.ru", "-"]);

        let mut kit = PdfKit::new(Source::file(path.as_str())?, configuration(&fake)?, &ConvertOptions::new());
        assert_eq!(kit.command(None)?[1..], [path.as_str(), "-"]);
        Ok(())
    }

    #[test]
    fn lists_of_inputs() -> TestResult {
        let fake = NamedTempFile::new()?;
        let html = NamedTempFile::new()?;
        let path = html.path().to_string_lossy().into_owned();

        let mut kit = PdfKit::new(
            Source::url(vec!["http://a", "http://b"]),
            configuration(&fake)?,
            &ConvertOptions::new(),
        );
        let cmd = kit.command(None)?;
        assert_eq!(cmd[cmd.len() - 3..], ["http://a", "http://b", "-"]);

        let mut kit = PdfKit::new(
            Source::file(vec![path.clone(), path.clone()])?,
            configuration(&fake)?,
            &ConvertOptions::new(),
        );
        let cmd = kit.command(None)?;
        assert_eq!(cmd[cmd.len() - 3..], [path.as_str(), path.as_str(), "-"]);
        Ok(())
    }

    #[test]
    fn meta_tags_become_options() -> TestResult {
        let fake = NamedTempFile::new()?;
        let body = r#"
        <html>
          <head>
            <meta name="pdfkit-page-size" content="Legal"/>
            <meta name="pdfkit-orientation" content="Landscape"/>
          </head>
          <br>
        </html>
        "#;
        let mut kit = PdfKit::new(Source::string(body), configuration(&fake)?, &ConvertOptions::new());
        let command = kit.command(None)?;
        assert_eq!(command[index_of(&command, "--page-size") + 1], "Legal");
        assert_eq!(command[index_of(&command, "--orientation") + 1], "Landscape");
        Ok(())
    }

    #[test]
    fn caller_options_override_meta_tags() -> TestResult {
        let fake = NamedTempFile::new()?;
        let body = r#"<head><meta name="pdfkit-page-size" content="Legal"></head>"#;
        let settings =
            ConvertOptions::new().options(Options::new().with("--page-size", "Letter"));
        let kit = PdfKit::new(Source::string(body), configuration(&fake)?, &settings);
        assert_eq!(
            kit.options().get("--page-size"),
            Some(&NormalizedValue::Value("Letter".to_string()))
        );
        Ok(())
    }

    #[test]
    fn meta_tags_ignored_for_urls() -> TestResult {
        let fake = NamedTempFile::new()?;
        let kit = PdfKit::new(
            Source::url(r#"<meta name="pdfkit-zoom" content="2">"#),
            configuration(&fake)?,
            &ConvertOptions::new(),
        );
        assert!(kit.options().is_empty());
        Ok(())
    }

    #[test]
    fn toc_without_options() -> TestResult {
        let fake = NamedTempFile::new()?;
        let settings =
            ConvertOptions::new().toc(Options::new().with("xsl-style-sheet", "test.xsl"));
        let mut kit = PdfKit::new(Source::string("html"), configuration(&fake)?, &settings);
        let command = kit.command(None)?;
        assert_eq!(command[1], "toc");
        assert_eq!(command[2], "--xsl-style-sheet");
        Ok(())
    }

    #[test]
    fn toc_and_cover_follow_global_options() -> TestResult {
        let fake = NamedTempFile::new()?;
        let options = page_options();
        let n = options.len();
        let settings = ConvertOptions::new()
            .options(options.clone())
            .toc(Options::new().with("xsl-style-sheet", "test.xsl"));
        let mut kit = PdfKit::new(Source::string("html"), configuration(&fake)?, &settings);
        let command = kit.command(None)?;
        assert_eq!(command[1 + n * 2], "toc");
        assert_eq!(command[1 + n * 2 + 1], "--xsl-style-sheet");

        let settings = ConvertOptions::new().options(options).cover("test.html");
        let mut kit = PdfKit::new(Source::string("html"), configuration(&fake)?, &settings);
        let command = kit.command(None)?;
        assert_eq!(command[1 + n * 2], "cover");
        assert_eq!(command[1 + n * 2 + 1], "test.html");
        Ok(())
    }

    #[test]
    fn toc_before_cover_by_default() -> TestResult {
        let fake = NamedTempFile::new()?;
        let settings = ConvertOptions::new()
            .options(page_options())
            .toc(Options::new().with("xsl-style-sheet", "test.xsl"))
            .cover("test.html");
        let mut kit = PdfKit::new(Source::string("html"), configuration(&fake)?, &settings);
        let command = kit.command(None)?;
        assert_eq!(
            command[command.len() - 7..],
            ["toc", "--xsl-style-sheet", "test.xsl", "cover", "test.html", "-", "-"]
        );
        Ok(())
    }

    #[test]
    fn cover_first_swaps_segments() -> TestResult {
        let fake = NamedTempFile::new()?;
        let settings = ConvertOptions::new()
            .options(page_options())
            .toc(Options::new().with("xsl-style-sheet", "test.xsl"))
            .cover("test.html")
            .cover_first(true);
        let mut kit = PdfKit::new(Source::string("html"), configuration(&fake)?, &settings);
        let command = kit.command(None)?;
        assert_eq!(
            command[command.len() - 7..],
            ["cover", "test.html", "toc", "--xsl-style-sheet", "test.xsl", "-", "-"]
        );
        Ok(())
    }

    #[test]
    fn outline_flag_without_value() -> TestResult {
        let fake = NamedTempFile::new()?;
        let settings = ConvertOptions::new().options(
            Options::new()
                .with("outline", OptionValue::Flag)
                .with("outline-depth", 1),
        );
        let mut kit = PdfKit::new(Source::url("ya.ru"), configuration(&fake)?, &settings);
        let cmd = kit.command(None)?;
        assert_eq!(cmd[1..], ["--outline", "--outline-depth", "1", "ya.ru", "-"]);
        Ok(())
    }

    #[test]
    fn empty_none_and_false_values() -> TestResult {
        let fake = NamedTempFile::new()?;
        let settings = ConvertOptions::new().options(
            Options::new()
                .with("outline", "")
                .with("footer-line", None::<String>)
                .with("quiet", false),
        );
        let mut kit = PdfKit::new(Source::string("html"), configuration(&fake)?, &settings);
        let cmd = kit.command(None)?;
        assert_eq!(cmd[1..], ["--outline", "--footer-line", "-", "-"]);
        Ok(())
    }

    #[test]
    fn css_injected_once_into_file_source() -> TestResult {
        let fake = NamedTempFile::new()?;
        let mut html = NamedTempFile::new()?;
        write!(html, "<html><head></head><body>Hai!</body></html>")?;
        let mut css = NamedTempFile::new()?;
        write!(css, "body {{ font-size: 80%; }}")?;

        let settings = ConvertOptions::new().css(css.path());
        let mut kit = PdfKit::new(Source::file(html.path())?, configuration(&fake)?, &settings);
        let command = kit.command(None)?;
        assert_eq!(command[1..], ["-", "-"]);
        assert!(kit.source().is_inline_string());

        kit.command(None)?;
        let payload = kit.stdin_payload()?.unwrap_or_default();
        let text = String::from_utf8(payload)?;
        assert_eq!(text.matches("<style>").count(), 1);
        assert!(text.contains("<style>body { font-size: 80%; }</style></head>"));
        Ok(())
    }

    #[test]
    fn css_on_url_fails_and_keeps_source() -> TestResult {
        let fake = NamedTempFile::new()?;
        let css = NamedTempFile::new()?;
        let settings = ConvertOptions::new().css(css.path());
        let mut kit = PdfKit::new(Source::url("http://ya.ru"), configuration(&fake)?, &settings);
        assert!(matches!(kit.command(None), Err(PdfError::ImproperSource(_))));
        assert!(kit.source().is_url());
        assert!(matches!(kit.to_pdf(None), Err(PdfError::ImproperSource(_))));
        Ok(())
    }

    #[test]
    fn stdin_payload_by_source() -> TestResult {
        let fake = NamedTempFile::new()?;
        let html = NamedTempFile::new()?;

        let mut kit = PdfKit::new(Source::string("<p>x</p>"), configuration(&fake)?, &ConvertOptions::new());
        assert_eq!(kit.stdin_payload()?, Some(b"<p>x</p>".to_vec()));

        let stream = FileStream::new(Cursor::new(b"<p>stream</p>".to_vec()));
        let mut kit = PdfKit::new(Source::stream(stream), configuration(&fake)?, &ConvertOptions::new());
        assert_eq!(kit.command(None)?[1..], ["-", "-"]);
        assert_eq!(kit.stdin_payload()?, Some(b"<p>stream</p>".to_vec()));

        let mut kit = PdfKit::new(Source::file(html.path())?, configuration(&fake)?, &ConvertOptions::new());
        assert_eq!(kit.stdin_payload()?, None);

        let mut kit = PdfKit::new(Source::url("http://ya.ru"), configuration(&fake)?, &ConvertOptions::new());
        assert_eq!(kit.stdin_payload()?, None);
        Ok(())
    }
}
