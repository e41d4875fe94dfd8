use crate::directive::Directive;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_STYLE: &str = ".mdl.rb";

#[derive(Debug)]
pub enum SettingsError {
    Read(std::io::Error),
    Parse(toml::de::Error),
    InvalidOverride(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Read(e) => write!(f, "failed to read settings: {}", e),
            SettingsError::Parse(e) => write!(f, "failed to parse settings: {}", e),
            SettingsError::InvalidOverride(s) => write!(f, "invalid override entry: '{}'", s),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Top-level `mdlstyle.toml` structure.
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub mdlstyle: MdlstyleSection,
}

/// The `[mdlstyle]` section.
#[derive(Debug, Default, Deserialize)]
pub struct MdlstyleSection {
    /// Style file to load, relative to the settings file.
    pub style: Option<PathBuf>,
    /// Rule overrides applied after the style file; `~` prefix excludes.
    #[serde(default)]
    pub rules: Vec<String>,
    /// Tag overrides applied after the style file; `~` prefix excludes.
    #[serde(default)]
    pub tags: Vec<String>,
    /// File-name globs used by `check` when discovering style files.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl TomlConfig {
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(SettingsError::Read)?;
        toml::from_str(&text).map_err(SettingsError::Parse)
    }

    /// Style file path, resolved against the directory holding the settings file.
    pub fn style_path(&self, settings_dir: &Path) -> PathBuf {
        let style = self
            .mdlstyle
            .style
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STYLE));
        if style.is_absolute() {
            style
        } else {
            settings_dir.join(style)
        }
    }

    /// Convert the `rules` and `tags` lists into directives, rules first.
    pub fn overrides(&self) -> Result<Vec<Directive>, SettingsError> {
        let mut out = Vec::new();
        for entry in &self.mdlstyle.rules {
            let (excluded, id) = split_override(entry)?;
            out.push(if excluded {
                Directive::ExcludeRule(id)
            } else {
                Directive::IncludeRule(id)
            });
        }
        for entry in &self.mdlstyle.tags {
            let (excluded, tag) = split_override(entry)?;
            out.push(if excluded {
                Directive::ExcludeTag(tag)
            } else {
                Directive::IncludeTag(tag)
            });
        }
        Ok(out)
    }
}

fn split_override(entry: &str) -> Result<(bool, String), SettingsError> {
    let trimmed = entry.trim();
    let (excluded, name) = match trimmed.strip_prefix('~') {
        Some(rest) => (true, rest.trim()),
        None => (false, trimmed),
    };
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(SettingsError::InvalidOverride(entry.to_string()));
    }
    Ok((excluded, name.to_string()))
}
