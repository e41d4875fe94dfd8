use crate::config::{ParamValue, RuleConfiguration};
use std::fmt;

/// One configuration intent, as expressed by a single style-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `all`
    EnableAll,
    /// `rule 'MD001'` with no options.
    IncludeRule(String),
    /// `exclude_rule 'MD001'`
    ExcludeRule(String),
    /// `rule 'MD013', :line_length => 100`
    SetRuleParameter {
        rule: String,
        key: String,
        value: ParamValue,
    },
    /// `tag :headers`
    IncludeTag(String),
    /// `exclude_tag :headers`
    ExcludeTag(String),
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::EnableAll => write!(f, "all"),
            Directive::IncludeRule(id) => write!(f, "rule '{}'", id),
            Directive::ExcludeRule(id) => write!(f, "exclude_rule '{}'", id),
            Directive::SetRuleParameter { rule, key, value } => {
                write!(f, "rule '{}', :{} => {}", rule, key, value)
            }
            Directive::IncludeTag(tag) => write!(f, "tag :{}", tag),
            Directive::ExcludeTag(tag) => write!(f, "exclude_tag :{}", tag),
        }
    }
}

/// Fold one directive into a configuration.
///
/// Later directives win over earlier ones for the same rule, parameter or tag.
/// Setting a parameter never changes whether the rule is enabled.
pub fn apply(directive: &Directive, mut config: RuleConfiguration) -> RuleConfiguration {
    match directive {
        Directive::EnableAll => config.enable_all(),
        Directive::IncludeRule(id) => config.set_enabled(id, true),
        Directive::ExcludeRule(id) => config.set_enabled(id, false),
        Directive::SetRuleParameter { rule, key, value } => {
            config.set_param(rule, key, value.clone())
        }
        Directive::IncludeTag(tag) => config.set_tag(tag, true),
        Directive::ExcludeTag(tag) => config.set_tag(tag, false),
    }
    config
}

/// Fold a directive sequence left to right, starting from the default configuration.
pub fn apply_all<'a, I>(directives: I) -> RuleConfiguration
where
    I: IntoIterator<Item = &'a Directive>,
{
    directives
        .into_iter()
        .fold(RuleConfiguration::default(), |config, d| apply(d, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(rule: &str, key: &str, value: i64) -> Directive {
        Directive::SetRuleParameter {
            rule: rule.into(),
            key: key.into(),
            value: ParamValue::Integer(value),
        }
    }

    #[test]
    fn exclude_then_param_stays_disabled() {
        let config = apply_all(&[
            Directive::ExcludeRule("MD007".into()),
            set("MD007", "indent", 4),
        ]);
        assert!(!config.is_enabled("MD007"));
        assert_eq!(config.param("MD007", "indent"), Some(&ParamValue::Integer(4)));
    }

    #[test]
    fn param_is_idempotent() {
        let once = apply_all(&[set("MD013", "line_length", 99999)]);
        let twice = apply_all(&[set("MD013", "line_length", 99999), set("MD013", "line_length", 99999)]);
        assert_eq!(once, twice);
    }

    #[test]
    fn last_param_wins() {
        let config = apply_all(&[set("MD013", "line_length", 80), set("MD013", "line_length", 120)]);
        assert_eq!(
            config.param("MD013", "line_length"),
            Some(&ParamValue::Integer(120))
        );
    }

    #[test]
    fn include_after_exclude_reenables() {
        let config = apply_all(&[
            Directive::ExcludeRule("MD033".into()),
            Directive::IncludeRule("MD033".into()),
        ]);
        assert!(config.is_enabled("MD033"));
    }

    #[test]
    fn tags_are_last_write_wins() {
        let config = apply_all(&[
            Directive::IncludeTag("html".into()),
            Directive::ExcludeTag("html".into()),
        ]);
        assert_eq!(config.tag_state("html"), Some(false));
        assert_eq!(config.tag_state("headers"), None);
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(set("MD007", "indent", 4).to_string(), "rule 'MD007', :indent => 4");
        assert_eq!(Directive::ExcludeTag("html".into()).to_string(), "exclude_tag :html");
    }
}
