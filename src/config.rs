//! Optional config file loading. Search order: ./pdfwrap.toml, then
//! $XDG_CONFIG_HOME/pdfwrap/config.toml (or ~/.config/pdfwrap/config.toml).

use crate::options::Options;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Renderer executable. When unset it is looked up on PATH.
    pub renderer: Option<PathBuf>,
    /// Prefix of directive meta tags (default "pdfkit-").
    pub meta_tag_prefix: Option<String>,
    /// Directory for the default output file when -o is not set.
    pub output_dir: Option<PathBuf>,
    /// Pass --quiet to the renderer and hide the spinner.
    pub quiet: Option<bool>,
    /// Default renderer options, in file order. Command-line options win.
    pub options: Option<Options>,
    /// Explicit renderer environment. When set the renderer does not inherit ours.
    pub env: Option<BTreeMap<String, String>>,
}

/// Search order: (1) ./pdfwrap.toml, (2) $XDG_CONFIG_HOME/pdfwrap/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("pdfwrap.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("pdfwrap").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            log::debug!("loaded config {}", path.display());
            return Ok(Some(config));
        }
    }
    Ok(None)
}
