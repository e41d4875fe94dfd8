use crate::catalog::{Catalog, ResolvedRule};
use crate::config::{ParamValue, RuleConfiguration};
use crate::discover::CheckResult;
use serde::Serialize;
use serde_json::json;
use std::fmt::{self, Write as _};

#[derive(Debug)]
pub enum FormatError {
    Json(serde_json::Error),
    Toml(toml::ser::Error),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Json(e) => write!(f, "failed to encode JSON: {}", e),
            FormatError::Toml(e) => write!(f, "failed to encode TOML: {}", e),
        }
    }
}

impl std::error::Error for FormatError {}

#[derive(Serialize)]
struct ResolvedOutput<'a> {
    rules: &'a [ResolvedRule],
}

fn state_str(enabled: bool) -> &'static str {
    if enabled {
        "\x1b[32menabled \x1b[0m"
    } else {
        "\x1b[31mdisabled\x1b[0m"
    }
}

fn params_str<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a ParamValue)>,
{
    params
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the rules a style file mentions, with tag state.
pub fn pretty_config(config: &RuleConfiguration, catalog: &Catalog) -> String {
    let mut out = String::new();
    if config.rules().next().is_none() {
        let _ = writeln!(out, "\x1b[90mNo rule directives.\x1b[0m");
    }
    for (id, settings) in config.rules() {
        let alias = catalog.lookup(id).map(|r| r.alias).unwrap_or("?");
        let _ = writeln!(
            out,
            "  {:<8} {} \x1b[90m{:<30}\x1b[0m {}",
            id,
            state_str(settings.is_enabled()),
            alias,
            params_str(&settings.params)
        );
    }

    let tags: Vec<_> = config.tags().collect();
    if !tags.is_empty() {
        let _ = writeln!(out, "\n\x1b[1mTags:\x1b[0m");
        for (tag, enabled) in tags {
            let _ = writeln!(out, "  {:<15} {}", tag, state_str(enabled));
        }
    }
    out
}

/// Render every catalog rule after resolution.
pub fn pretty_resolved(resolved: &[ResolvedRule]) -> String {
    let mut out = String::new();
    for rule in resolved {
        let _ = writeln!(
            out,
            "  {:<8} {} \x1b[90m{:<30}\x1b[0m {}",
            rule.id,
            state_str(rule.enabled),
            rule.alias,
            params_str(&rule.params)
        );
    }
    let enabled = resolved.iter().filter(|r| r.enabled).count();
    let _ = writeln!(
        out,
        "\n\x1b[1m{} of {} rules enabled\x1b[0m",
        enabled,
        resolved.len()
    );
    out
}

pub fn json_config(config: &RuleConfiguration) -> Result<String, FormatError> {
    serde_json::to_string_pretty(config).map_err(FormatError::Json)
}

pub fn json_resolved(resolved: &[ResolvedRule]) -> Result<String, FormatError> {
    serde_json::to_string_pretty(&ResolvedOutput { rules: resolved }).map_err(FormatError::Json)
}

pub fn toml_config(config: &RuleConfiguration) -> Result<String, FormatError> {
    toml::to_string_pretty(config).map_err(FormatError::Toml)
}

pub fn toml_resolved(resolved: &[ResolvedRule]) -> Result<String, FormatError> {
    toml::to_string_pretty(&ResolvedOutput { rules: resolved }).map_err(FormatError::Toml)
}

/// Print one line per checked file, then a summary.
pub fn print_check_pretty(result: &CheckResult) {
    if result.outcomes.is_empty() {
        println!("\x1b[33m!\x1b[0m No style files found");
        return;
    }

    for outcome in &result.outcomes {
        match &outcome.result {
            Ok(config) => println!(
                "\x1b[32m✓\x1b[0m {} \x1b[90m({} rules referenced)\x1b[0m",
                outcome.path.display(),
                config.rules().count()
            ),
            Err(e) => println!("\x1b[31m✗\x1b[0m {}", e),
        }
    }

    let failed = result.failures().count();
    println!();
    if failed == 0 {
        println!(
            "\x1b[1m\x1b[32m{} style file{} valid\x1b[0m",
            result.outcomes.len(),
            if result.outcomes.len() == 1 { "" } else { "s" }
        );
    } else {
        println!(
            "\x1b[1m\x1b[31m{} of {} style file{} invalid\x1b[0m",
            failed,
            result.outcomes.len(),
            if result.outcomes.len() == 1 { "" } else { "s" }
        );
    }
}

/// Check results as structured JSON.
pub fn json_check(result: &CheckResult) -> Result<String, FormatError> {
    let files: Vec<_> = result
        .outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(config) => json!({
                "path": o.path.display().to_string(),
                "valid": true,
                "config": config,
            }),
            Err(e) => json!({
                "path": o.path.display().to_string(),
                "valid": false,
                "error": e.to_string(),
            }),
        })
        .collect();

    let output = json!({
        "files": files,
        "summary": {
            "total": result.outcomes.len(),
            "invalid": result.failures().count(),
        },
    });
    serde_json::to_string_pretty(&output).map_err(FormatError::Json)
}
