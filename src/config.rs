use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A single rule parameter value as written in a style file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Integer(i64),
    Bool(bool),
    String(String),
    /// A `:symbol` literal, e.g. `:atx`.
    Symbol(String),
    List(Vec<ParamValue>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(n) => write!(f, "{}", n),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::String(s) => write!(f, "{:?}", s),
            ParamValue::Symbol(s) => write!(f, ":{}", s),
            ParamValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Integer(n) => serializer.serialize_i64(*n),
            ParamValue::Bool(b) => serializer.serialize_bool(*b),
            ParamValue::String(s) | ParamValue::Symbol(s) => serializer.serialize_str(s),
            ParamValue::List(items) => items.serialize(serializer),
        }
    }
}

/// Resolved state of one rule.
///
/// `enabled` is `None` until a directive explicitly includes or excludes the
/// rule; a rule that only had parameters set keeps `None`.
#[derive(Debug, Clone, Serialize)]
pub struct RuleSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Parameter overrides keyed by option name.
    pub params: BTreeMap<String, ParamValue>,
    /// Directive position of the last enabled-state change.
    #[serde(skip)]
    enabled_at: u64,
    #[serde(skip)]
    param_at: BTreeMap<String, u64>,
}

impl PartialEq for RuleSettings {
    fn eq(&self, other: &Self) -> bool {
        self.enabled == other.enabled && self.params == other.params
    }
}

impl Eq for RuleSettings {}

impl RuleSettings {
    fn new() -> Self {
        Self {
            enabled: None,
            params: BTreeMap::new(),
            enabled_at: 0,
            param_at: BTreeMap::new(),
        }
    }

    /// Effective state: rules never explicitly toggled are enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Explicit state with the directive position that set it.
    pub fn explicit_state(&self) -> Option<(u64, bool)> {
        self.enabled.map(|e| (self.enabled_at, e))
    }

    /// Parameters with the directive position that last set each one.
    pub fn params_with_position(&self) -> impl Iterator<Item = (u64, &str, &ParamValue)> {
        self.params.iter().map(move |(k, v)| {
            (self.param_at.get(k).copied().unwrap_or(0), k.as_str(), v)
        })
    }
}

/// The resolved set of rule states and parameters produced by loading a style file.
///
/// Rules never mentioned by a directive are enabled. Tag states are tracked
/// separately because only the rule engine knows which rules carry which tag.
/// Every write remembers its directive position so a consumer that merges
/// aliases or tags can still honour last-write-wins across them. Positions
/// take no part in equality.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleConfiguration {
    rules: BTreeMap<String, RuleSettings>,
    tags: BTreeMap<String, bool>,
    #[serde(skip)]
    tag_at: BTreeMap<String, u64>,
    #[serde(skip)]
    clock: u64,
}

impl PartialEq for RuleConfiguration {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules && self.tags == other.tags
    }
}

impl Eq for RuleConfiguration {}

impl RuleConfiguration {
    pub fn is_enabled(&self, id: &str) -> bool {
        self.rules.get(id).map_or(true, RuleSettings::is_enabled)
    }

    /// Parameter overrides for a rule, if the rule was referenced.
    pub fn params(&self, id: &str) -> Option<&BTreeMap<String, ParamValue>> {
        self.rules.get(id).map(|r| &r.params)
    }

    pub fn param(&self, id: &str, key: &str) -> Option<&ParamValue> {
        self.rules.get(id).and_then(|r| r.params.get(key))
    }

    /// Every rule referenced by at least one directive, in id order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &RuleSettings)> {
        self.rules.iter().map(|(id, s)| (id.as_str(), s))
    }

    pub fn rule(&self, id: &str) -> Option<&RuleSettings> {
        self.rules.get(id)
    }

    /// Explicit tag state, `None` when the tag was never mentioned.
    pub fn tag_state(&self, tag: &str) -> Option<bool> {
        self.tags.get(tag).copied()
    }

    /// Tag state with the directive position that set it.
    pub fn tag_entry(&self, tag: &str) -> Option<(u64, bool)> {
        let state = self.tags.get(tag)?;
        Some((self.tag_at.get(tag).copied().unwrap_or(0), *state))
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, bool)> {
        self.tags.iter().map(|(t, &s)| (t.as_str(), s))
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Re-enable everything switched off so far, rules and tags alike.
    pub(crate) fn enable_all(&mut self) {
        let at = self.tick();
        for settings in self.rules.values_mut() {
            if settings.enabled.is_some() {
                settings.enabled = Some(true);
                settings.enabled_at = at;
            }
        }
        for (tag, state) in self.tags.iter_mut() {
            *state = true;
            self.tag_at.insert(tag.clone(), at);
        }
    }

    pub(crate) fn set_enabled(&mut self, id: &str, enabled: bool) {
        let at = self.tick();
        let settings = self
            .rules
            .entry(id.to_string())
            .or_insert_with(RuleSettings::new);
        settings.enabled = Some(enabled);
        settings.enabled_at = at;
    }

    pub(crate) fn set_param(&mut self, id: &str, key: &str, value: ParamValue) {
        let at = self.tick();
        let settings = self
            .rules
            .entry(id.to_string())
            .or_insert_with(RuleSettings::new);
        settings.params.insert(key.to_string(), value);
        settings.param_at.insert(key.to_string(), at);
    }

    pub(crate) fn set_tag(&mut self, tag: &str, enabled: bool) {
        let at = self.tick();
        self.tags.insert(tag.to_string(), enabled);
        self.tag_at.insert(tag.to_string(), at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_everything() {
        let config = RuleConfiguration::default();
        assert!(config.is_enabled("MD001"));
        assert!(config.params("MD001").is_none());
        assert_eq!(config.rules().count(), 0);
    }

    #[test]
    fn param_keeps_enabled_state() {
        let mut config = RuleConfiguration::default();
        config.set_enabled("MD013", false);
        config.set_param("MD013", "line_length", ParamValue::Integer(120));
        assert!(!config.is_enabled("MD013"));
        assert_eq!(
            config.param("MD013", "line_length"),
            Some(&ParamValue::Integer(120))
        );
    }

    #[test]
    fn enable_all_reenables_referenced_rules() {
        let mut config = RuleConfiguration::default();
        config.set_enabled("MD002", false);
        config.enable_all();
        assert!(config.is_enabled("MD002"));
    }

    #[test]
    fn param_only_rule_has_no_explicit_state() {
        let mut config = RuleConfiguration::default();
        config.set_param("MD013", "line_length", ParamValue::Integer(100));
        let settings = config.rule("MD013").unwrap();
        assert_eq!(settings.enabled, None);
        assert!(settings.is_enabled());
        assert!(settings.explicit_state().is_none());
    }

    #[test]
    fn enable_all_clears_tag_exclusions() {
        let mut config = RuleConfiguration::default();
        config.set_tag("html", false);
        config.enable_all();
        assert_eq!(config.tag_state("html"), Some(true));
        assert_eq!(config.tag_entry("html"), Some((2, true)));
    }

    #[test]
    fn positions_do_not_affect_equality() {
        let mut once = RuleConfiguration::default();
        once.set_param("MD007", "indent", ParamValue::Integer(4));
        let mut twice = once.clone();
        twice.set_param("MD007", "indent", ParamValue::Integer(4));
        assert_eq!(once, twice);
    }

    #[test]
    fn display_values() {
        let list = ParamValue::List(vec![
            ParamValue::String("br".into()),
            ParamValue::Symbol("atx".into()),
            ParamValue::Integer(-3),
            ParamValue::Bool(false),
        ]);
        assert_eq!(list.to_string(), r#"["br", :atx, -3, false]"#);
    }

    #[test]
    fn symbols_serialize_as_strings() {
        let value = ParamValue::Symbol("consistent".into());
        assert_eq!(serde_json::to_string(&value).unwrap(), r#""consistent""#);
    }
}
