//! Stylesheet injection into a single HTML document.

use crate::error::{PdfError, Result};
use crate::source::{Inputs, Source};
use std::path::{Path, PathBuf};

const HEAD_CLOSE: &str = "</head>";

pub fn style_tag_for(stylesheet: &str) -> String {
    format!("<style>{}</style>", stylesheet)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PdfError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read every stylesheet in order and join them with a newline.
pub fn read_stylesheets(paths: &[PathBuf]) -> Result<String> {
    let sheets = paths
        .iter()
        .map(|p| read_text(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(sheets.join("\n"))
}

/// Insert the style block before the first `</head>`, or at the very start when there is none.
pub fn insert_style(html: &str, stylesheet: &str) -> String {
    let tag = style_tag_for(stylesheet);
    match html.find(HEAD_CLOSE) {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..idx]);
            out.push_str(&tag);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{}{}", tag, html),
    }
}

/// Produce a new inline-string source carrying `stylesheets`.
///
/// Only a single file or an inline string can take stylesheets; URLs, collections and streams
/// are refused and the caller keeps its original source.
pub fn inject_css(source: &Source, stylesheets: &[PathBuf]) -> Result<Source> {
    let html = match source {
        Source::InlineString(html) => html.clone(),
        Source::FilePath(Inputs::One(path)) => read_text(Path::new(path))?,
        Source::Url(_) | Source::FilePath(Inputs::Many(_)) | Source::FileStream(_) => {
            return Err(PdfError::ImproperSource(
                "CSS file can be added only to a single file or string".to_string(),
            ))
        }
    };
    let css = read_stylesheets(stylesheets)?;
    log::debug!("injecting {} stylesheet(s)", stylesheets.len());
    Ok(Source::string(insert_style(&html, &css)))
}
