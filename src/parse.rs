//! Style-file line grammar.
//!
//! Each non-blank, non-comment line holds exactly one directive:
//!
//! ```text
//! all
//! rule 'MD013', :line_length => 120, :tables => false
//! rule "MD007", indent: 4
//! exclude_rule 'MD033'
//! tag :headers
//! exclude_tag :html
//! ```
//!
//! Arguments may be wrapped in parentheses. A `#` outside a quoted string
//! starts a comment that runs to the end of the line.

use crate::config::ParamValue;
use crate::directive::Directive;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnknownDirective(String),
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    MissingArgument(&'static str),
    UnterminatedString,
    InvalidInteger(String),
    UnexpectedCharacter(char),
    /// The built-in token grammar failed to compile.
    InvalidGrammar(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnknownDirective(name) => write!(f, "unknown directive '{}'", name),
            ParseErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            ParseErrorKind::MissingArgument(what) => write!(f, "missing {}", what),
            ParseErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            ParseErrorKind::InvalidInteger(s) => write!(f, "invalid integer '{}'", s),
            ParseErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            ParseErrorKind::InvalidGrammar(e) => write!(f, "invalid token grammar: {}", e),
        }
    }
}

/// A line that matches no directive form. Loading stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    pub kind: ParseErrorKind,
    /// The offending line, untrimmed.
    pub text: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} (in `{}`)", self.line, self.kind, self.text.trim())
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    /// `name:` keyword-argument label.
    Label(String),
    Symbol(String),
    Str(String),
    Int(i64),
    Arrow,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Label(s) => write!(f, "'{}:'", s),
            Token::Symbol(s) => write!(f, "':{}'", s),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::Int(n) => write!(f, "integer {}", n),
            Token::Arrow => write!(f, "'=>'"),
            Token::Comma => write!(f, "','"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
        }
    }
}

fn token_regex() -> Result<&'static Regex, ParseErrorKind> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r##"(?x)^(?:
                (?P<ws>\s+)
              | (?P<comment>\#.*)
              | (?P<arrow>=>)
              | (?P<int>[+-]?[0-9][0-9_]*)
              | '(?P<sq>(?:[^'\\]|\\.)*)'
              | "(?P<dq>(?:[^"\\]|\\.)*)"
              | :(?P<sym>[A-Za-z_][A-Za-z0-9_]*[?!]?)
              | (?P<label>[A-Za-z_][A-Za-z0-9_]*):
              | (?P<ident>[A-Za-z_][A-Za-z0-9_]*)
              | (?P<punct>[(),\[\]])
            )"##,
        )
    })
    .as_ref()
    .map_err(|e| ParseErrorKind::InvalidGrammar(e.to_string()))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseErrorKind> {
    let re = token_regex()?;
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let caps = match re.captures(rest) {
            Some(c) => c,
            None => {
                let c = rest.chars().next().unwrap_or(' ');
                return Err(if c == '\'' || c == '"' {
                    ParseErrorKind::UnterminatedString
                } else {
                    ParseErrorKind::UnexpectedCharacter(c)
                });
            }
        };
        let whole = caps.get(0).map_or(0, |m| m.end());
        pos += whole;

        if caps.name("ws").is_some() {
            continue;
        }
        if caps.name("comment").is_some() {
            break;
        }

        let token = if caps.name("arrow").is_some() {
            Token::Arrow
        } else if let Some(m) = caps.name("int") {
            let digits: String = m.as_str().chars().filter(|&c| c != '_').collect();
            let n = digits
                .parse::<i64>()
                .map_err(|_| ParseErrorKind::InvalidInteger(m.as_str().to_string()))?;
            Token::Int(n)
        } else if let Some(m) = caps.name("sq").or_else(|| caps.name("dq")) {
            Token::Str(unescape(m.as_str()))
        } else if let Some(m) = caps.name("sym") {
            Token::Symbol(m.as_str().to_string())
        } else if let Some(m) = caps.name("label") {
            Token::Label(m.as_str().to_string())
        } else if let Some(m) = caps.name("ident") {
            Token::Ident(m.as_str().to_string())
        } else {
            match caps.name("punct").map(|m| m.as_str()) {
                Some("(") => Token::LParen,
                Some(")") => Token::RParen,
                Some(",") => Token::Comma,
                Some("[") => Token::LBracket,
                _ => Token::RBracket,
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ParseErrorKind> {
        match self.bump() {
            Some(t) if t == token => Ok(()),
            Some(t) => Err(ParseErrorKind::UnexpectedToken {
                expected,
                found: t.to_string(),
            }),
            None => Err(ParseErrorKind::MissingArgument(expected)),
        }
    }

    fn finish(&self) -> Result<(), ParseErrorKind> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(ParseErrorKind::UnexpectedToken {
                expected: "end of line",
                found: t.to_string(),
            }),
        }
    }

    /// Consume `(` if present; the caller must pass the result to `close_paren`.
    fn open_paren(&mut self) -> bool {
        self.eat(&Token::LParen)
    }

    fn close_paren(&mut self, opened: bool) -> Result<(), ParseErrorKind> {
        if opened {
            self.expect(Token::RParen, "')'")?;
        }
        Ok(())
    }

    fn rule_id(&mut self) -> Result<String, ParseErrorKind> {
        match self.bump() {
            Some(Token::Str(s)) => Ok(s),
            Some(t) => Err(ParseErrorKind::UnexpectedToken {
                expected: "quoted rule id",
                found: t.to_string(),
            }),
            None => Err(ParseErrorKind::MissingArgument("rule id")),
        }
    }

    fn tag_name(&mut self) -> Result<String, ParseErrorKind> {
        match self.bump() {
            Some(Token::Symbol(s)) | Some(Token::Str(s)) => Ok(s),
            Some(t) => Err(ParseErrorKind::UnexpectedToken {
                expected: "tag name",
                found: t.to_string(),
            }),
            None => Err(ParseErrorKind::MissingArgument("tag name")),
        }
    }

    fn option(&mut self) -> Result<(String, ParamValue), ParseErrorKind> {
        let key = match self.bump() {
            Some(Token::Label(k)) => return Ok((k, self.value()?)),
            Some(Token::Symbol(k)) | Some(Token::Str(k)) => k,
            Some(t) => {
                return Err(ParseErrorKind::UnexpectedToken {
                    expected: "option name",
                    found: t.to_string(),
                })
            }
            None => return Err(ParseErrorKind::MissingArgument("option name")),
        };
        self.expect(Token::Arrow, "'=>'")?;
        Ok((key, self.value()?))
    }

    fn value(&mut self) -> Result<ParamValue, ParseErrorKind> {
        match self.bump() {
            Some(Token::Int(n)) => Ok(ParamValue::Integer(n)),
            Some(Token::Str(s)) => Ok(ParamValue::String(s)),
            Some(Token::Symbol(s)) => Ok(ParamValue::Symbol(s)),
            Some(Token::Ident(s)) if s == "true" => Ok(ParamValue::Bool(true)),
            Some(Token::Ident(s)) if s == "false" => Ok(ParamValue::Bool(false)),
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                loop {
                    if self.eat(&Token::RBracket) {
                        break;
                    }
                    items.push(self.value()?);
                    if !self.eat(&Token::Comma) {
                        self.expect(Token::RBracket, "']'")?;
                        break;
                    }
                }
                Ok(ParamValue::List(items))
            }
            Some(t) => Err(ParseErrorKind::UnexpectedToken {
                expected: "value",
                found: t.to_string(),
            }),
            None => Err(ParseErrorKind::MissingArgument("value")),
        }
    }

    fn directive(&mut self) -> Result<Vec<Directive>, ParseErrorKind> {
        let keyword = match self.bump() {
            None => return Ok(Vec::new()),
            Some(Token::Ident(k)) => k,
            Some(t) => return Err(ParseErrorKind::UnknownDirective(t.to_string())),
        };

        let directives = match keyword.as_str() {
            "all" => {
                let paren = self.open_paren();
                self.close_paren(paren)?;
                vec![Directive::EnableAll]
            }
            "rule" => {
                let paren = self.open_paren();
                let id = self.rule_id()?;
                let mut options = Vec::new();
                while self.eat(&Token::Comma) {
                    options.push(self.option()?);
                }
                self.close_paren(paren)?;
                if options.is_empty() {
                    vec![Directive::IncludeRule(id)]
                } else {
                    options
                        .into_iter()
                        .map(|(key, value)| Directive::SetRuleParameter {
                            rule: id.clone(),
                            key,
                            value,
                        })
                        .collect()
                }
            }
            "exclude_rule" => {
                let paren = self.open_paren();
                let id = self.rule_id()?;
                self.close_paren(paren)?;
                vec![Directive::ExcludeRule(id)]
            }
            "tag" | "exclude_tag" => {
                let paren = self.open_paren();
                let tag = self.tag_name()?;
                self.close_paren(paren)?;
                if keyword == "tag" {
                    vec![Directive::IncludeTag(tag)]
                } else {
                    vec![Directive::ExcludeTag(tag)]
                }
            }
            _ => return Err(ParseErrorKind::UnknownDirective(keyword.clone())),
        };

        self.finish()?;
        Ok(directives)
    }
}

/// Parse a single style-file line.
///
/// Blank and comment lines yield no directives. A `rule` line carrying several
/// options yields one `SetRuleParameter` per option, in source order.
pub fn parse_line(line_no: usize, text: &str) -> Result<Vec<Directive>, ParseError> {
    let err = |kind| ParseError {
        line: line_no,
        kind,
        text: text.to_string(),
    };
    let tokens = tokenize(text).map_err(err)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.directive().map_err(err)
}

/// Parse a whole style file into its directive sequence, failing on the first bad line.
pub fn parse_source(source: &str) -> Result<Vec<Directive>, ParseError> {
    let mut directives = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        directives.extend(parse_line(idx + 1, line)?);
    }
    Ok(directives)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(line: &str) -> Directive {
        let mut ds = parse_line(1, line).unwrap();
        assert_eq!(ds.len(), 1, "expected one directive from {:?}", line);
        ds.remove(0)
    }

    fn kind(line: &str) -> ParseErrorKind {
        parse_line(1, line).unwrap_err().kind
    }

    #[test]
    fn token_grammar_compiles() {
        assert!(token_regex().is_ok());
    }

    #[test]
    fn enable_all() {
        assert_eq!(one("all"), Directive::EnableAll);
        assert_eq!(one("  all()  "), Directive::EnableAll);
    }

    #[test]
    fn exclude_rule() {
        assert_eq!(one("exclude_rule 'MD002'"), Directive::ExcludeRule("MD002".into()));
        assert_eq!(one("exclude_rule(\"MD002\")"), Directive::ExcludeRule("MD002".into()));
    }

    #[test]
    fn rule_parameter_forms_agree() {
        let expected = Directive::SetRuleParameter {
            rule: "MD007".into(),
            key: "indent".into(),
            value: ParamValue::Integer(4),
        };
        assert_eq!(one("rule 'MD007', :indent => 4"), expected);
        assert_eq!(one("rule \"MD007\", indent: 4"), expected);
        assert_eq!(one("rule('MD007', :indent=>4)"), expected);
        assert_eq!(one("rule 'MD007', 'indent' => 4"), expected);
    }

    #[test]
    fn multiple_options_in_order() {
        let ds = parse_line(1, "rule 'MD013', :line_length => 1_000, :tables => false").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds[0],
            Directive::SetRuleParameter {
                rule: "MD013".into(),
                key: "line_length".into(),
                value: ParamValue::Integer(1000),
            }
        );
        assert_eq!(
            ds[1],
            Directive::SetRuleParameter {
                rule: "MD013".into(),
                key: "tables".into(),
                value: ParamValue::Bool(false),
            }
        );
    }

    #[test]
    fn value_kinds() {
        let d = one("rule 'MD033', :allowed_elements => ['br', \"img\", :sup, -1,]");
        match d {
            Directive::SetRuleParameter { value, .. } => assert_eq!(
                value,
                ParamValue::List(vec![
                    ParamValue::String("br".into()),
                    ParamValue::String("img".into()),
                    ParamValue::Symbol("sup".into()),
                    ParamValue::Integer(-1),
                ])
            ),
            other => panic!("unexpected directive {:?}", other),
        }
        match one("rule 'MD003', :style => :atx") {
            Directive::SetRuleParameter { value, .. } => {
                assert_eq!(value, ParamValue::Symbol("atx".into()))
            }
            other => panic!("unexpected directive {:?}", other),
        }
    }

    #[test]
    fn bare_rule_includes() {
        assert_eq!(one("rule 'MD041'"), Directive::IncludeRule("MD041".into()));
    }

    #[test]
    fn tags() {
        assert_eq!(one("tag :headers"), Directive::IncludeTag("headers".into()));
        assert_eq!(one("exclude_tag 'html'"), Directive::ExcludeTag("html".into()));
    }

    #[test]
    fn comments_and_blanks_are_empty() {
        assert!(parse_line(1, "").unwrap().is_empty());
        assert!(parse_line(1, "   \t").unwrap().is_empty());
        assert!(parse_line(1, "# Enable all rules by default").unwrap().is_empty());
        assert!(parse_line(1, "   # indented comment").unwrap().is_empty());
    }

    #[test]
    fn trailing_comment_ignored_but_hash_in_string_kept() {
        assert_eq!(one("exclude_rule 'MD033' # allow html"), Directive::ExcludeRule("MD033".into()));
        match one("rule 'MD026', :punctuation => '.,;#' # no hashes") {
            Directive::SetRuleParameter { value, .. } => {
                assert_eq!(value, ParamValue::String(".,;#".into()))
            }
            other => panic!("unexpected directive {:?}", other),
        }
    }

    #[test]
    fn escapes_in_strings() {
        match one(r"rule 'MD026', :punctuation => 'it\'s'") {
            Directive::SetRuleParameter { value, .. } => {
                assert_eq!(value, ParamValue::String("it's".into()))
            }
            other => panic!("unexpected directive {:?}", other),
        }
    }

    #[test]
    fn missing_comma_is_an_error() {
        let err = parse_line(7, "rule 'MD013' line_length 99999").unwrap_err();
        assert_eq!(err.line, 7);
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { expected: "end of line", .. }));
        assert!(err.to_string().starts_with("line 7:"));
    }

    #[test]
    fn unknown_directive() {
        assert_eq!(kind("include_rule 'MD001'"), ParseErrorKind::UnknownDirective("include_rule".into()));
        assert!(matches!(kind("'MD001'"), ParseErrorKind::UnknownDirective(_)));
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(kind("exclude_rule 'MD002"), ParseErrorKind::UnterminatedString);
        assert_eq!(kind("exclude_rule"), ParseErrorKind::MissingArgument("rule id"));
        assert!(matches!(kind("exclude_rule MD002"), ParseErrorKind::UnexpectedToken { .. }));
        assert!(matches!(kind("rule 'MD013', :line_length"), ParseErrorKind::MissingArgument("'=>'")));
        assert!(matches!(kind("rule 'MD013', :line_length =>"), ParseErrorKind::MissingArgument("value")));
        assert!(matches!(kind("rule('MD013', :line_length => 1"), ParseErrorKind::MissingArgument("')'")));
        assert!(matches!(kind("all 'MD001'"), ParseErrorKind::UnexpectedToken { .. }));
        assert_eq!(kind("rule 'MD013', :x => 1 ; all"), ParseErrorKind::UnexpectedCharacter(';'));
        assert!(matches!(
            kind("rule 'MD013', :x => 99999999999999999999"),
            ParseErrorKind::InvalidInteger(_)
        ));
    }

    #[test]
    fn parse_source_reports_first_bad_line() {
        let src = "all\n\nexclude_rule 'MD002'\nbogus\nalso bogus\n";
        let err = parse_source(src).unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.text, "bogus");
    }
}
