//! Per-document options embedded as `<meta name="{prefix}{option}" content="{value}">` tags.

use crate::options::{OptionValue, Options};
use scraper::{Html, Selector};

/// Default prefix marking directive meta tags.
pub const DEFAULT_META_TAG_PREFIX: &str = "pdfkit-";

/// Collect options from meta tags whose `name` starts with `prefix`.
///
/// The HTML parser tolerates unclosed tags, attribute reordering and unquoted values.
/// A matching tag without `content` yields a flag. Later tags win on duplicate names.
pub fn find_options_in_meta(html: &str, prefix: &str) -> Options {
    let mut found = Options::new();
    let Ok(selector) = Selector::parse("meta[name]") else {
        return found;
    };
    let document = Html::parse_document(html);
    for element in document.select(&selector) {
        let el = element.value();
        let Some(name) = el.attr("name") else {
            continue;
        };
        match name.strip_prefix(prefix) {
            Some(option) if !option.is_empty() => {
                let value = match el.attr("content") {
                    Some(content) => OptionValue::Text(content.to_string()),
                    None => OptionValue::Flag,
                };
                found.insert(option, value);
            }
            _ => log::trace!("ignoring meta tag name={:?}", name),
        }
    }
    found
}
