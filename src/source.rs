//! Conversion input: URL(s), file path(s), an open stream, or inline HTML.

use crate::error::{PdfError, Result};
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// One input or an ordered collection of inputs.
///
/// A `Many` with a single element is still a collection: CSS injection refuses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inputs {
    One(String),
    Many(Vec<String>),
}

impl Inputs {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let items: &[String] = match self {
            Inputs::One(s) => std::slice::from_ref(s),
            Inputs::Many(v) => v.as_slice(),
        };
        items.iter().map(String::as_str)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Inputs::Many(_))
    }
}

impl From<&str> for Inputs {
    fn from(s: &str) -> Self {
        Inputs::One(s.to_string())
    }
}

impl From<String> for Inputs {
    fn from(s: String) -> Self {
        Inputs::One(s)
    }
}

impl From<&Path> for Inputs {
    fn from(p: &Path) -> Self {
        Inputs::One(p.to_string_lossy().into_owned())
    }
}

impl From<Vec<String>> for Inputs {
    fn from(v: Vec<String>) -> Self {
        Inputs::Many(v)
    }
}

impl From<Vec<&str>> for Inputs {
    fn from(v: Vec<&str>) -> Self {
        Inputs::Many(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Inputs {
    fn from(v: &[&str]) -> Self {
        Inputs::Many(v.iter().map(|s| s.to_string()).collect())
    }
}

/// An already-open readable resource. Wrapping a reader in `FileStream` is what marks it
/// as stream input; nothing is inferred from the reader's type.
pub struct FileStream {
    reader: Box<dyn Read + Send>,
    name: Option<String>,
}

impl FileStream {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            name: None,
        }
    }

    /// Open a file for streaming; the path becomes the stream name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PdfError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::new(file).with_name(path.to_string_lossy()))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Read the remaining stream contents.
    pub fn read_all(&mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Source selector used by the CLI and `Source::from_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Url,
    File,
    String,
}

/// The document handed to the renderer. The variant is fixed at construction.
#[derive(Debug)]
pub enum Source {
    Url(Inputs),
    FilePath(Inputs),
    FileStream(FileStream),
    InlineString(String),
}

impl Source {
    pub fn url(inputs: impl Into<Inputs>) -> Self {
        Source::Url(inputs.into())
    }

    /// File source. Every path must exist; the first missing one is reported.
    pub fn file(inputs: impl Into<Inputs>) -> Result<Self> {
        let inputs = inputs.into();
        if let Some(missing) = inputs.iter().find(|p| !Path::new(p).exists()) {
            return Err(PdfError::InputNotFound {
                path: PathBuf::from(missing),
            });
        }
        Ok(Source::FilePath(inputs))
    }

    pub fn stream(stream: FileStream) -> Self {
        Source::FileStream(stream)
    }

    pub fn string(text: impl Into<String>) -> Self {
        Source::InlineString(text.into())
    }

    pub fn from_kind(kind: SourceKind, inputs: Inputs) -> Result<Self> {
        match (kind, inputs) {
            (SourceKind::Url, inputs) => Ok(Source::url(inputs)),
            (SourceKind::File, inputs) => Source::file(inputs),
            (SourceKind::String, Inputs::One(text)) => Ok(Source::string(text)),
            (SourceKind::String, Inputs::Many(_)) => Err(PdfError::ImproperSource(
                "An inline string source must be a single document".to_string(),
            )),
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Source::Url(_))
    }

    pub fn is_file_path(&self) -> bool {
        matches!(self, Source::FilePath(_))
    }

    pub fn is_file_stream(&self) -> bool {
        matches!(self, Source::FileStream(_))
    }

    pub fn is_inline_string(&self) -> bool {
        matches!(self, Source::InlineString(_))
    }

    /// True for `Url`/`FilePath` sources built from a list.
    pub fn is_collection(&self) -> bool {
        match self {
            Source::Url(inputs) | Source::FilePath(inputs) => inputs.is_collection(),
            _ => false,
        }
    }

    /// The literal URL, path or string. Collections are joined by a space; streams give their
    /// name when one is known.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Source::Url(Inputs::One(s)) | Source::FilePath(Inputs::One(s)) => {
                Some(Cow::Borrowed(s.as_str()))
            }
            Source::Url(Inputs::Many(v)) | Source::FilePath(Inputs::Many(v)) => {
                Some(Cow::Owned(v.join(" ")))
            }
            Source::FileStream(stream) => stream.name().map(Cow::Borrowed),
            Source::InlineString(s) => Some(Cow::Borrowed(s.as_str())),
        }
    }

    /// Whether the renderer reads this source from standard input.
    pub fn reads_stdin(&self) -> bool {
        self.is_inline_string() || self.is_file_stream()
    }

    /// Command tokens naming the input: `-` for stdin, otherwise every URL/path in order.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Source::Url(inputs) | Source::FilePath(inputs) => {
                inputs.iter().map(str::to_string).collect()
            }
            Source::FileStream(_) | Source::InlineString(_) => vec!["-".to_string()],
        }
    }
}
