use crate::config::{ParamValue, RuleConfiguration, RuleSettings};
use serde::Serialize;
use std::collections::BTreeMap;

/// Static description of one markdownlint rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleInfo {
    pub id: &'static str,
    pub alias: &'static str,
    pub tags: &'static [&'static str],
}

/// A catalog rule after the configuration has been applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRule {
    pub id: &'static str,
    pub alias: &'static str,
    pub enabled: bool,
    pub params: BTreeMap<String, ParamValue>,
}

macro_rules! rule {
    ($id:literal, $alias:literal, [$($tag:literal),*]) => {
        RuleInfo { id: $id, alias: $alias, tags: &[$($tag),*] }
    };
}

const BUILTIN: &[RuleInfo] = &[
    rule!("MD001", "header-increment", ["headers"]),
    rule!("MD002", "first-header-h1", ["headers"]),
    rule!("MD003", "header-style", ["headers"]),
    rule!("MD004", "ul-style", ["bullet", "ul"]),
    rule!("MD005", "list-indent", ["bullet", "ul", "indentation"]),
    rule!("MD006", "ul-start-left", ["bullet", "ul", "indentation"]),
    rule!("MD007", "ul-indent", ["bullet", "ul", "indentation"]),
    rule!("MD009", "no-trailing-spaces", ["whitespace"]),
    rule!("MD010", "no-hard-tabs", ["whitespace", "hard_tab"]),
    rule!("MD011", "no-reversed-links", ["links"]),
    rule!("MD012", "no-multiple-blanks", ["whitespace", "blank_lines"]),
    rule!("MD013", "line-length", ["line_length"]),
    rule!("MD014", "commands-show-output", ["code"]),
    rule!("MD018", "no-missing-space-atx", ["headers", "atx", "spaces"]),
    rule!("MD019", "no-multiple-space-atx", ["headers", "atx", "spaces"]),
    rule!("MD020", "no-missing-space-closed-atx", ["headers", "atx_closed", "spaces"]),
    rule!("MD021", "no-multiple-space-closed-atx", ["headers", "atx_closed", "spaces"]),
    rule!("MD022", "blanks-around-headers", ["headers", "blank_lines"]),
    rule!("MD023", "header-start-left", ["headers", "spaces"]),
    rule!("MD024", "no-duplicate-header", ["headers"]),
    rule!("MD025", "single-h1", ["headers"]),
    rule!("MD026", "no-trailing-punctuation", ["headers"]),
    rule!("MD027", "no-multiple-space-blockquote", ["blockquote", "whitespace", "indentation"]),
    rule!("MD028", "no-blanks-blockquote", ["blockquote", "whitespace"]),
    rule!("MD029", "ol-prefix", ["ol"]),
    rule!("MD030", "list-marker-space", ["ol", "ul", "whitespace"]),
    rule!("MD031", "blanks-around-fences", ["code", "blank_lines"]),
    rule!("MD032", "blanks-around-lists", ["bullet", "ul", "ol", "blank_lines"]),
    rule!("MD033", "no-inline-html", ["html"]),
    rule!("MD034", "no-bare-urls", ["links", "url"]),
    rule!("MD035", "hr-style", ["hr"]),
    rule!("MD036", "no-emphasis-as-header", ["headers", "emphasis"]),
    rule!("MD037", "no-space-in-emphasis", ["whitespace", "emphasis"]),
    rule!("MD038", "no-space-in-code", ["whitespace", "code"]),
    rule!("MD039", "no-space-in-links", ["whitespace", "links"]),
    rule!("MD040", "fenced-code-language", ["code", "language"]),
    rule!("MD041", "first-line-h1", ["headers"]),
    rule!("MD046", "code-block-style", ["code"]),
    rule!("MD047", "single-trailing-newline", ["blank_lines"]),
];

/// The set of rules an evaluation engine knows about.
///
/// The loader never consults this; it is only used by consumers that want to
/// expand tag directives or flag rule ids nobody recognizes.
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: Vec<RuleInfo>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN.to_vec(),
        }
    }

    pub fn new(rules: Vec<RuleInfo>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RuleInfo] {
        &self.rules
    }

    /// Find a rule by id (`MD013`) or alias (`line-length`), case-insensitively.
    pub fn lookup(&self, id_or_alias: &str) -> Option<&RuleInfo> {
        self.rules.iter().find(|r| Self::names(r, id_or_alias))
    }

    /// Whether `name` refers to `info`, by id or alias, ignoring case.
    fn names(info: &RuleInfo, name: &str) -> bool {
        info.id.eq_ignore_ascii_case(name) || info.alias.eq_ignore_ascii_case(name)
    }

    /// Every configuration entry that refers to `info`.
    fn entries<'a>(
        config: &'a RuleConfiguration,
        info: &'a RuleInfo,
    ) -> impl Iterator<Item = &'a RuleSettings> {
        config
            .rules()
            .filter(move |(name, _)| Self::names(info, name))
            .map(|(_, settings)| settings)
    }

    /// Enabled state for a catalog rule.
    ///
    /// The latest directive touching the rule wins, whether it named the rule
    /// by id, by alias, or through one of its tags. Rules nothing touched are
    /// enabled.
    pub fn is_enabled(&self, config: &RuleConfiguration, info: &RuleInfo) -> bool {
        let explicit = Self::entries(config, info).filter_map(|s| s.explicit_state());
        let tagged = info.tags.iter().filter_map(|t| config.tag_entry(t));
        explicit
            .chain(tagged)
            .max_by_key(|&(at, _)| at)
            .map_or(true, |(_, enabled)| enabled)
    }

    /// Parameters for a catalog rule, merged across its id and alias entries.
    fn params(config: &RuleConfiguration, info: &RuleInfo) -> BTreeMap<String, ParamValue> {
        let mut writes: Vec<(u64, &str, &ParamValue)> = Self::entries(config, info)
            .flat_map(|s| s.params_with_position())
            .collect();
        writes.sort_by_key(|&(at, _, _)| at);
        writes
            .into_iter()
            .map(|(_, key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    /// Apply a configuration to every catalog rule, in catalog order.
    pub fn resolve(&self, config: &RuleConfiguration) -> Vec<ResolvedRule> {
        self.rules
            .iter()
            .map(|info| ResolvedRule {
                id: info.id,
                alias: info.alias,
                enabled: self.is_enabled(config, info),
                params: Self::params(config, info),
            })
            .collect()
    }

    /// Rule ids referenced by the configuration that the catalog does not know.
    pub fn unknown_rules<'a>(&self, config: &'a RuleConfiguration) -> Vec<&'a str> {
        config
            .rules()
            .map(|(id, _)| id)
            .filter(|id| self.lookup(id).is_none())
            .collect()
    }

    /// Tags referenced by the configuration that no catalog rule carries.
    pub fn unknown_tags<'a>(&self, config: &'a RuleConfiguration) -> Vec<&'a str> {
        config
            .tags()
            .map(|(tag, _)| tag)
            .filter(|tag| !self.rules.iter().any(|r| r.tags.iter().any(|t| t == tag)))
            .collect()
    }

    /// Log one warning per unknown rule id or tag; returns how many were logged.
    pub fn warn_unknown(&self, config: &RuleConfiguration) -> usize {
        let rules = self.unknown_rules(config);
        let tags = self.unknown_tags(config);
        for id in &rules {
            tracing::warn!("unknown rule '{}'", id);
        }
        for tag in &tags {
            tracing::warn!("unknown tag '{}'", tag);
        }
        rules.len() + tags.len()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
