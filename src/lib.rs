//! Loader for markdownlint style files.
//!
//! A style file is a list of directives (`all`, `rule`, `exclude_rule`, `tag`,
//! `exclude_tag`) folded left to right into a [`RuleConfiguration`] that a rule
//! engine reads to decide which rules run and with which parameters.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod directive;
pub mod discover;
pub mod loader;
pub mod parse;

pub use config::{ParamValue, RuleConfiguration, RuleSettings};
pub use directive::{apply, Directive};
pub use loader::{load, load_file, LoadError};
pub use parse::{ParseError, ParseErrorKind};
