//! Renderer configuration: executable location, meta tag prefix, and child environment.
//!
//! Passed explicitly into every conversion; there is no process-wide instance.

use crate::error::{PdfError, Result};
use crate::meta::DEFAULT_META_TAG_PREFIX;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Executable name looked up on PATH when no renderer path is given.
pub const DEFAULT_RENDERER: &str = "wkhtmltopdf";

/// Resolved renderer settings for one or more conversions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    renderer: PathBuf,
    meta_tag_prefix: String,
    environment: Option<Vec<(String, String)>>,
}

impl Configuration {
    /// Discover the renderer on PATH with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    pub fn renderer(&self) -> &Path {
        &self.renderer
    }

    pub fn meta_tag_prefix(&self) -> &str {
        &self.meta_tag_prefix
    }

    /// Explicit child environment, if one was configured. `None` means inherit.
    pub fn environment(&self) -> Option<&[(String, String)]> {
        self.environment.as_deref()
    }

    /// Apply the configured environment to a command.
    pub(crate) fn apply_env(&self, cmd: &mut Command) {
        if let Some(env) = &self.environment {
            cmd.env_clear();
            cmd.envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }
}

/// Builder for [Configuration].
#[derive(Debug)]
pub struct ConfigurationBuilder {
    renderer: Option<PathBuf>,
    meta_tag_prefix: String,
    environment: Option<Vec<(String, String)>>,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            renderer: None,
            meta_tag_prefix: DEFAULT_META_TAG_PREFIX.to_string(),
            environment: None,
        }
    }
}

impl ConfigurationBuilder {
    /// Use this renderer executable instead of searching PATH.
    pub fn renderer(mut self, path: impl Into<PathBuf>) -> Self {
        self.renderer = Some(path.into());
        self
    }

    /// Prefix of directive meta tags. Default `pdfkit-`.
    pub fn meta_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.meta_tag_prefix = prefix.into();
        self
    }

    /// Add a variable to an explicit child environment. Once any variable is set the child
    /// no longer inherits the caller's environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    /// Resolve the renderer path and check that it can be opened.
    pub fn build(self) -> Result<Configuration> {
        let renderer = match self.renderer {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => discover_renderer()?,
        };
        File::open(&renderer).map_err(|e| {
            PdfError::Configuration(format!(
                "No {} executable found: \"{}\" ({}).\n\
                 If this file exists please check that this process can read it, \
                 or pass the path explicitly. Otherwise install {}.",
                DEFAULT_RENDERER,
                renderer.display(),
                e,
                DEFAULT_RENDERER
            ))
        })?;
        log::debug!("using renderer {}", renderer.display());
        Ok(Configuration {
            renderer,
            meta_tag_prefix: self.meta_tag_prefix,
            environment: self.environment,
        })
    }
}

/// Ask the platform lookup tool for the renderer and take the first line of its answer.
fn discover_renderer() -> Result<PathBuf> {
    let lookup = if cfg!(windows) { "where.exe" } else { "which" };
    let output = Command::new(lookup)
        .arg(DEFAULT_RENDERER)
        .output()
        .map_err(|e| {
            PdfError::Configuration(format!(
                "Could not run {} to locate {}: {}",
                lookup, DEFAULT_RENDERER, e
            ))
        })?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().map(str::trim).unwrap_or_default();
    if first.is_empty() {
        return Err(PdfError::Configuration(format!(
            "No {} executable found on PATH. Install it or pass the renderer path explicitly.",
            DEFAULT_RENDERER
        )));
    }
    log::debug!("{} {} -> {}", lookup, DEFAULT_RENDERER, first);
    Ok(PathBuf::from(first))
}
