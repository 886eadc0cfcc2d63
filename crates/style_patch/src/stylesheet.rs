//! Structured, source-preserving view of a stylesheet.
//!
//! Top-level style rules are parsed with `cssparser` into a selector prelude
//! and an ordered declaration list. Every declaration remembers where its value
//! sits in the source text, so edits are spliced back in place and anything
//! the model does not understand (comments, at-rules, nested blocks) survives
//! serialization byte for byte.

use core::ops::Range;
use cssparser::AtRuleParser as CssAtRuleParser;
use cssparser::BasicParseErrorKind;
use cssparser::CowRcStr;
use cssparser::DeclarationParser as CssDeclarationParser;
use cssparser::ParseError;
use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ParserState;
use cssparser::QualifiedRuleParser as CssQualifiedRuleParser;
use cssparser::RuleBodyItemParser as CssRuleBodyItemParser;
use cssparser::RuleBodyParser as CssRuleBodyParser;
use cssparser::StyleSheetParser;
use log::debug;

const DEFAULT_INDENT: &str = "  ";

/// A single CSS declaration (property: value [!important]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub name: String,
    /// Value text (without trailing !important).
    pub value: String,
    /// Whether the declaration was marked as `!important`.
    pub important: bool,
    /// Byte range of `value` in the source; `None` for appended declarations.
    value_span: Option<Range<usize>>,
    edited: bool,
}

impl Declaration {
    fn appended(name: &str, value: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: value.to_owned(),
            important: false,
            value_span: None,
            edited: true,
        }
    }
}

/// What `StyleRule::set_property` did to the rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyChange {
    /// The property existed; its previous value is returned.
    Replaced { previous: String },
    /// The property was appended to the end of the block.
    Inserted,
}

/// A top-level style rule: a selector prelude and its declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// Raw prelude text (typically the selector list).
    pub prelude: String,
    declarations: Vec<Declaration>,
    /// Byte range of the text between `{` and `}`.
    body: Range<usize>,
    /// Where appended declarations are spliced in.
    insert_at: usize,
    /// Whether the last existing item lacks a terminating `;`.
    needs_separator: bool,
    multiline: bool,
    line_ending: &'static str,
    indent: String,
}

impl StyleRule {
    /// Declarations in source order, followed by appended ones.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Whether the prelude names exactly `selector` (whitespace-insensitive).
    pub fn matches_selector(&self, selector: &str) -> bool {
        normalize_selector(&self.prelude) == normalize_selector(selector)
    }

    /// The effective value of `name`: the last declaration for it wins.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|decl| decl.name.eq_ignore_ascii_case(name))
            .map(|decl| decl.value.as_str())
    }

    /// Set `name` to `value`.
    ///
    /// Every existing declaration of the property keeps its position and
    /// `!important` flag and takes the new value. A property that is not
    /// present is appended after the last declaration.
    pub fn set_property(&mut self, name: &str, value: &str) -> PropertyChange {
        let mut previous = None;
        for decl in self
            .declarations
            .iter_mut()
            .filter(|decl| decl.name.eq_ignore_ascii_case(name))
        {
            previous = Some(core::mem::replace(&mut decl.value, value.to_owned()));
            decl.edited = true;
        }
        if let Some(previous) = previous {
            return PropertyChange::Replaced { previous };
        }
        self.declarations.push(Declaration::appended(name, value));
        PropertyChange::Inserted
    }

    fn splices(&self, source: &str) -> Vec<(Range<usize>, String)> {
        let mut out = Vec::new();
        for decl in self.declarations.iter().filter(|decl| decl.edited) {
            if let Some(span) = &decl.value_span {
                out.push((span.clone(), decl.value.clone()));
            }
        }

        let appended: Vec<&Declaration> = self
            .declarations
            .iter()
            .filter(|decl| decl.value_span.is_none())
            .collect();
        if appended.is_empty() {
            return out;
        }

        let mut text = String::new();
        if self.needs_separator {
            text.push(';');
        }
        for decl in appended {
            if self.multiline {
                text.push_str(self.line_ending);
                text.push_str(&self.indent);
            } else {
                text.push(' ');
            }
            text.push_str(&decl.name);
            text.push_str(": ");
            text.push_str(&decl.value);
            text.push(';');
        }
        // An empty single-line block such as `.x {}` still needs a space before `}`.
        let body = source.get(self.body.clone()).unwrap_or_default();
        if !self.multiline && body.trim().is_empty() && !body.ends_with(' ') {
            text.push(' ');
        }
        out.push((self.insert_at..self.insert_at, text));
        out
    }
}

/// A parsed stylesheet that can be edited and written back out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    source: String,
    /// Top-level style rules in source order.
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    /// Parse stylesheet text. Unparseable rules are kept verbatim but not modelled.
    pub fn parse(css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut top = TopLevelParser { source: css };
        let mut rules = Vec::new();
        for item in StyleSheetParser::new(&mut parser, &mut top) {
            match item {
                Ok(rule) => rules.push(rule),
                Err((_err, slice)) => debug!("skipping unmodelled stylesheet item: {slice}"),
            }
        }
        Self {
            source: css.to_owned(),
            rules,
        }
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// First rule whose prelude is exactly `selector`.
    pub fn rule(&self, selector: &str) -> Option<&StyleRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches_selector(selector))
    }

    /// Mutable access to the first rule whose prelude is exactly `selector`.
    pub fn rule_mut(&mut self, selector: &str) -> Option<&mut StyleRule> {
        self.rules
            .iter_mut()
            .find(|rule| rule.matches_selector(selector))
    }

    /// Serialize, splicing edits into the source text.
    pub fn to_css(&self) -> String {
        let mut splices: Vec<(Range<usize>, String)> = self
            .rules
            .iter()
            .flat_map(|rule| rule.splices(&self.source))
            .collect();
        splices.sort_by_key(|(range, _)| (range.start, range.end));

        let mut out = String::with_capacity(self.source.len() + 64);
        let mut cursor = 0;
        for (range, text) in splices {
            if range.start < cursor {
                continue;
            }
            out.push_str(self.source.get(cursor..range.start).unwrap_or_default());
            out.push_str(&text);
            cursor = range.end;
        }
        out.push_str(self.source.get(cursor..).unwrap_or_default());
        out
    }
}

fn normalize_selector(selector: &str) -> String {
    selector.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse `!important` at the end of a value, returning (`value_without_important`, `important_flag`).
///
/// The keyword is ASCII case-insensitive and may be separated from `!` by whitespace.
fn split_important_tail(value: &str) -> (&str, bool) {
    const KEYWORD: &str = "important";
    let trimmed = value.trim();
    let Some(keyword_start) = trimmed.len().checked_sub(KEYWORD.len()) else {
        return (trimmed, false);
    };
    if let Some(keyword) = trimmed.get(keyword_start..)
        && keyword.eq_ignore_ascii_case(KEYWORD)
        && let Some(before) = trimmed.get(..keyword_start)
        && let Some(prefix) = before.trim_end().strip_suffix('!')
    {
        return (prefix.trim_end(), true);
    }
    (trimmed, false)
}

/// `body` without comments at its end.
fn strip_trailing_comments(body: &str) -> &str {
    let mut rest = body.trim_end();
    while rest.ends_with("*/")
        && let Some(open) = rest.rfind("/*")
        && let Some(before) = rest.get(..open)
    {
        rest = before.trim_end();
    }
    rest
}

/// A declaration parser that records property name, raw value and its location.
struct BodyDeclParser;

impl CssDeclarationParser<'_> for BodyDeclParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'input>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, '_>,
        _decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = input.position();
        // Consume until end of the declaration item.
        while input.next_including_whitespace_and_comments().is_ok() {}
        let raw = input.slice_from(start);
        let (value, important) = split_important_tail(raw);
        let value_start = start.byte_index() + (raw.len() - raw.trim_start().len());
        Ok(Declaration {
            name: name.to_ascii_lowercase(),
            value: value.to_owned(),
            important,
            value_span: Some(value_start..value_start + value.len()),
            edited: false,
        })
    }
}

impl CssAtRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl CssQualifiedRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl CssRuleBodyItemParser<'_, Declaration, ()> for BodyDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Top-level parser that builds `StyleRule` items for qualified rules.
/// At-rules fall through to the default rejection and stay verbatim.
struct TopLevelParser<'src> {
    source: &'src str,
}

impl CssAtRuleParser<'_> for TopLevelParser<'_> {
    type Prelude = ();
    type AtRule = StyleRule;
    type Error = ();
}

impl CssQualifiedRuleParser<'_> for TopLevelParser<'_> {
    type Prelude = String;
    type QualifiedRule = StyleRule;
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let start = input.state();
        while input.next_including_whitespace_and_comments().is_ok() {}
        Ok(input.slice_from(start.position()).trim().to_owned())
    }

    fn parse_block<'input>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        let body_start = input.position().byte_index();
        let declarations = parse_declarations_from_block(input);
        while input.next_including_whitespace_and_comments().is_ok() {}
        let body_end = input.position().byte_index();
        Ok(build_rule(self.source, prelude, declarations, body_start..body_end))
    }
}

/// Parse declarations from a rule block using `cssparser` body parser.
fn parse_declarations_from_block(block: &mut Parser) -> Vec<Declaration> {
    let mut body = BodyDeclParser;
    CssRuleBodyParser::new(block, &mut body).flatten().collect()
}

fn build_rule(
    source: &str,
    prelude: String,
    declarations: Vec<Declaration>,
    body: Range<usize>,
) -> StyleRule {
    let text = source.get(body.clone()).unwrap_or_default();
    let content = text.trim_end();
    let last_item = strip_trailing_comments(content);
    let needs_separator = !last_item.trim_start().is_empty()
        && !last_item.ends_with(';')
        && !last_item.ends_with('}');
    StyleRule {
        prelude,
        declarations,
        insert_at: body.start + content.len(),
        needs_separator,
        multiline: text.contains('\n'),
        line_ending: if text.contains("\r\n") { "\r\n" } else { "\n" },
        indent: detect_indent(text),
        body,
    }
}

/// Leading whitespace of the first non-blank line after the opening brace.
fn detect_indent(body: &str) -> String {
    body.lines()
        .skip(1)
        .find(|line| !line.trim().is_empty())
        .map(|line| {
            line.chars()
                .take_while(|ch| *ch == ' ' || *ch == '\t')
                .collect::<String>()
        })
        .filter(|indent| !indent.is_empty())
        .unwrap_or_else(|| DEFAULT_INDENT.to_owned())
}
