use crate::config::RuleConfiguration;
use crate::directive::{self, Directive};
use crate::parse::{self, ParseError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum LoadError {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, ParseError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Read(p, e) => write!(f, "failed to read {}: {}", p.display(), e),
            LoadError::Parse(p, e) => write!(f, "{}: {}", p.display(), e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Read(_, e) => Some(e),
            LoadError::Parse(_, e) => Some(e),
        }
    }
}

/// Parse style-file text and fold it into a configuration.
///
/// Fails on the first line that is not a recognized directive; no partial
/// configuration is ever returned.
pub fn load(source: &str) -> Result<RuleConfiguration, ParseError> {
    let directives = parse::parse_source(source)?;
    Ok(fold(&directives))
}

/// Apply extra directives on top of an already loaded configuration.
pub fn extend(config: RuleConfiguration, extra: &[Directive]) -> RuleConfiguration {
    extra.iter().fold(config, |config, d| {
        tracing::debug!(directive = %d, "applying override");
        directive::apply(d, config)
    })
}

/// Read and load a style file from disk.
pub fn load_file(path: &Path) -> Result<RuleConfiguration, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::Read(path.to_path_buf(), e))?;
    let config = load(&text).map_err(|e| LoadError::Parse(path.to_path_buf(), e))?;
    tracing::debug!(
        path = %path.display(),
        rules = config.rules().count(),
        "loaded style file"
    );
    Ok(config)
}

fn fold(directives: &[Directive]) -> RuleConfiguration {
    directives.iter().fold(RuleConfiguration::default(), |config, d| {
        tracing::trace!(directive = %d, "applying");
        directive::apply(d, config)
    })
}
