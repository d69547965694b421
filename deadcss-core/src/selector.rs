//! Stylesheet rule and class selector extraction.
//!
//! A small hand-rolled tokenizer rather than a full CSS parser: it only needs
//! rule boundaries, the selector text of each rule and the `.class` tokens
//! inside it. Supported dialects:
//!
//! - CSS, SCSS and Less share the brace tokenizer. Nested rules (`&.active {}`)
//!   and rules inside at-rule blocks (`@media`, `@supports`, `@include`) are
//!   extracted as rules of their own.
//! - Indented Sass syntax uses a line-oriented parser where a selector line
//!   owns every following line with deeper indentation.
//!
//! Extraction is best-effort. Unterminated rules are dropped while the rules
//! that did close are kept, so a half-typed stylesheet still produces results.

use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;

use serde::Serialize;

/// Stylesheet extensions recognized by the detector.
pub const STYLESHEET_EXTENSIONS: &[&str] = &["css", "scss", "less", "sass"];

/// Stylesheet syntax family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Css,
    Scss,
    Less,
    Sass,
}

impl Dialect {
    /// Dialect for a file extension (without dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(Self::Css),
            "scss" => Some(Self::Scss),
            "less" => Some(Self::Less),
            "sass" => Some(Self::Sass),
            _ => None,
        }
    }

    /// Dialect for a stylesheet path, `None` when it is not a stylesheet.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether `//` starts a comment running to the end of the line.
    fn has_line_comments(self) -> bool {
        !matches!(self, Self::Css)
    }

    /// Opening sequence of a selector interpolation, if the dialect has one.
    fn interpolation_sigil(self) -> Option<char> {
        match self {
            Self::Scss | Self::Sass => Some('#'),
            Self::Less => Some('@'),
            Self::Css => None,
        }
    }
}

/// 1-based line and column. Columns count UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// One `.name` token found in a rule's selector list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDeclaration {
    pub name: String,
    /// First character of the owning rule's selector.
    pub rule_start: SourcePosition,
    /// Last character of the owning rule (the closing `}` for brace dialects).
    pub rule_end: SourcePosition,
}

/// A rule block: selector list plus body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleBlock {
    /// Selector text as written, trimmed.
    pub selector: String,
    /// Class tokens of the selector in textual order (duplicates kept).
    pub class_names: Vec<String>,
    pub start: SourcePosition,
    /// Inclusive end position.
    pub end: SourcePosition,
    /// Byte range of the whole rule, end exclusive.
    pub span: Range<usize>,
}

impl RuleBlock {
    /// Whether the selector list contains the class `name`.
    pub fn has_class(&self, name: &str) -> bool {
        self.class_names.iter().any(|c| c == name)
    }
}

/// Maps byte offsets to [`SourcePosition`]s and back.
#[derive(Debug)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    /// Position of the character starting at byte `offset`.
    pub fn position(&self, offset: usize) -> SourcePosition {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let column = self
            .text
            .get(line_start..offset)
            .map(|s| s.encode_utf16().count())
            .unwrap_or(offset - line_start);
        SourcePosition::new(line + 1, column + 1)
    }

    /// Byte offset of a position, `None` when it lies outside the text.
    pub fn offset(&self, pos: SourcePosition) -> Option<usize> {
        if pos.line == 0 || pos.column == 0 {
            return None;
        }
        let line_start = *self.line_starts.get(pos.line - 1)?;
        let line_end = self
            .line_starts
            .get(pos.line)
            .copied()
            .unwrap_or(self.text.len());
        let line_text = &self.text[line_start..line_end];

        let mut units = 0;
        for (idx, ch) in line_text.char_indices() {
            if units == pos.column - 1 {
                return Some(line_start + idx);
            }
            units += ch.len_utf16();
        }
        (units == pos.column - 1).then_some(line_end)
    }
}

/// Extract class declarations from plain CSS.
pub fn extract(text: &str) -> Vec<ClassDeclaration> {
    extract_with_dialect(text, Dialect::Css)
}

/// Extract class declarations, one per class token, in textual order.
pub fn extract_with_dialect(text: &str, dialect: Dialect) -> Vec<ClassDeclaration> {
    extract_rules(text, dialect)
        .into_iter()
        .flat_map(|rule| {
            let RuleBlock {
                class_names,
                start,
                end,
                ..
            } = rule;
            class_names.into_iter().map(move |name| ClassDeclaration {
                name,
                rule_start: start,
                rule_end: end,
            })
        })
        .collect()
}

/// Class names deduplicated, in first-declaration order.
pub fn declared_names(declarations: &[ClassDeclaration]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(declarations.len());
    declarations
        .iter()
        .filter(|d| seen.insert(d.name.as_str()))
        .map(|d| d.name.clone())
        .collect()
}

/// Extract every rule block in document order (outer rules before nested ones).
pub fn extract_rules(text: &str, dialect: Dialect) -> Vec<RuleBlock> {
    let raw = match dialect {
        Dialect::Sass => indented_rules(text),
        _ => brace_rules(text, dialect),
    };

    let index = LineIndex::new(text);
    raw.into_iter()
        .map(|span| {
            let selector = text[span.selector.clone()].trim().to_string();
            let class_names = class_tokens(&selector, dialect);
            let last_char = text[..span.whole.end]
                .char_indices()
                .next_back()
                .map_or(span.whole.start, |(i, _)| i);
            RuleBlock {
                selector,
                class_names,
                start: index.position(span.whole.start),
                end: index.position(last_char),
                span: span.whole,
            }
        })
        .collect()
}

/// Byte ranges of one rule before positions are resolved.
struct RawRule {
    selector: Range<usize>,
    whole: Range<usize>,
}

// ============================================================================
// Brace dialects (CSS / SCSS / Less)
// ============================================================================

struct OpenRule {
    selector: Range<usize>,
    end: Option<usize>,
}

fn brace_rules(text: &str, dialect: Dialect) -> Vec<RawRule> {
    let bytes = text.as_bytes();
    let mut rules: Vec<OpenRule> = Vec::new();
    // One entry per open `{`: the rule it belongs to, if any
    let mut stack: Vec<Option<usize>> = Vec::new();
    let mut segment_start: Option<usize> = None;
    let mut paren_depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
                continue;
            }
            b'/' if dialect.has_line_comments()
                && paren_depth == 0
                && bytes.get(i + 1) == Some(&b'/') =>
            {
                i = skip_line(bytes, i);
                continue;
            }
            b'"' | b'\'' => {
                segment_start.get_or_insert(i);
                i = skip_string(bytes, i);
                continue;
            }
            b'\\' => {
                segment_start.get_or_insert(i);
                i += 2;
                continue;
            }
            b'#' | b'@'
                if bytes.get(i + 1) == Some(&b'{')
                    && dialect.interpolation_sigil() == Some(b as char) =>
            {
                segment_start.get_or_insert(i);
                i = skip_interpolation(bytes, i + 1);
                continue;
            }
            b'(' => {
                segment_start.get_or_insert(i);
                paren_depth += 1;
            }
            b')' => {
                paren_depth = paren_depth.saturating_sub(1);
            }
            b'{' => {
                let frame = match segment_start.take() {
                    Some(start) if bytes[start] != b'@' => {
                        rules.push(OpenRule {
                            selector: start..i,
                            end: None,
                        });
                        Some(rules.len() - 1)
                    }
                    // At-rule containers and anonymous blocks
                    _ => None,
                };
                stack.push(frame);
                paren_depth = 0;
            }
            b'}' => {
                if let Some(Some(idx)) = stack.pop() {
                    rules[idx].end = Some(i + 1);
                }
                segment_start = None;
                paren_depth = 0;
            }
            b';' if paren_depth == 0 => {
                segment_start = None;
            }
            b if b.is_ascii_whitespace() => {}
            _ => {
                segment_start.get_or_insert(i);
            }
        }
        i += 1;
    }

    rules
        .into_iter()
        .filter_map(|rule| {
            let end = rule.end?;
            Some(RawRule {
                whole: rule.selector.start..end,
                selector: rule.selector,
            })
        })
        .collect()
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_line(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| start + p)
}

/// Skip a quoted string starting at `start`. Unterminated strings end at the newline.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Skip a `{ ... }` interpolation body whose `{` is at `open`.
fn skip_interpolation(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'\n' => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

// ============================================================================
// Indented Sass
// ============================================================================

struct SassEntry {
    indent: usize,
    selector: Option<Range<usize>>,
    /// End of the entry's own (last) selector line.
    header_end: usize,
}

fn indented_rules(text: &str) -> Vec<RawRule> {
    let mut rules = Vec::new();
    let mut stack: Vec<SassEntry> = Vec::new();
    let mut last_end = 0usize;
    // Indent of an open comment block; deeper lines belong to it
    let mut comment_indent: Option<usize> = None;
    // Selector spilling onto the next line after a trailing comma
    let mut continued: Option<(usize, Range<usize>)> = None;

    let mut offset = 0;
    for raw_line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();

        let line = raw_line.trim_end_matches(['\n', '\r']);
        let content = line.trim_start();
        if content.trim().is_empty() {
            continue;
        }
        let indent = line.len() - content.len();
        let content = content.trim_end();
        let content_start = line_start + indent;
        let content_end = content_start + content.len();

        if let Some(ci) = comment_indent {
            if indent > ci {
                continue;
            }
            comment_indent = None;
        }

        if let Some((cont_indent, selector)) = continued.take() {
            let selector = selector.start..content_end;
            if content.ends_with(',') {
                continued = Some((cont_indent, selector));
            } else {
                stack.push(SassEntry {
                    indent: cont_indent,
                    selector: Some(selector),
                    header_end: content_end,
                });
                last_end = content_end;
            }
            continue;
        }

        if content.starts_with("//") || content.starts_with("/*") {
            comment_indent = Some(indent);
            continue;
        }

        close_sass_entries(&mut stack, &mut rules, indent, last_end);

        if content.starts_with('@') {
            stack.push(SassEntry {
                indent,
                selector: None,
                header_end: content_end,
            });
        } else if is_sass_selector_line(content) {
            if content.ends_with(',') {
                continued = Some((indent, content_start..content_end));
                continue;
            }
            stack.push(SassEntry {
                indent,
                selector: Some(content_start..content_end),
                header_end: content_end,
            });
        }
        last_end = content_end;
    }

    close_sass_entries(&mut stack, &mut rules, 0, last_end);
    rules.sort_by_key(|r: &RawRule| r.whole.start);
    rules
}

/// Pop every entry at or deeper than `indent`. Entries that own at least one
/// deeper line become rules ending at `last_end`.
fn close_sass_entries(
    stack: &mut Vec<SassEntry>,
    rules: &mut Vec<RawRule>,
    indent: usize,
    last_end: usize,
) {
    while stack.last().is_some_and(|e| e.indent >= indent) {
        let Some(entry) = stack.pop() else { break };
        if let Some(selector) = entry.selector {
            if last_end > entry.header_end {
                rules.push(RawRule {
                    whole: selector.start..last_end,
                    selector,
                });
            }
        }
    }
}

/// Directives, variables, mixin calls and property lines are not selectors.
fn is_sass_selector_line(content: &str) -> bool {
    if content.starts_with(['$', '+', '=', '@']) {
        return false;
    }
    // Old-style `:property value`
    if let Some(rest) = content.strip_prefix(':') {
        if rest
            .split_once(char::is_whitespace)
            .is_some_and(|(name, _)| name.chars().all(|c| c.is_ascii_alphabetic() || c == '-'))
        {
            return false;
        }
    }
    !looks_like_property(content)
}

/// `name: value` or `name:` (nested property group).
fn looks_like_property(content: &str) -> bool {
    let Some((name, rest)) = content.split_once(':') else {
        return false;
    };
    let name = name.trim_end();
    let is_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '#' || c == '{' || c == '}' || c == '$');
    is_name && (rest.is_empty() || rest.starts_with(char::is_whitespace))
}

// ============================================================================
// Class tokens
// ============================================================================

/// Class tokens of a selector list, in textual order.
///
/// Skips strings, comments, attribute selectors and interpolations. A class
/// token glued to an interpolation (`.btn-#{$size}`) is built dynamically and
/// is left out.
pub fn class_tokens(selector: &str, dialect: Dialect) -> Vec<String> {
    let chars: Vec<char> = selector.chars().collect();
    let sigil = dialect.interpolation_sigil();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '/' if next == Some('*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            '/' if next == Some('/') && dialect.has_line_comments() => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '"' | '\'' => i = skip_chars_string(&chars, i),
            '[' => {
                i += 1;
                while i < chars.len() && chars[i] != ']' {
                    if chars[i] == '"' || chars[i] == '\'' {
                        i = skip_chars_string(&chars, i);
                    } else {
                        i += 1;
                    }
                }
                i += 1;
            }
            '\\' => i += 2,
            _ if Some(c) == sigil && next == Some('{') => i = skip_chars_interpolation(&chars, i + 1),
            '.' => match read_ident(&chars, i + 1) {
                Some((name, end)) => {
                    let glued = sigil.is_some_and(|s| {
                        chars.get(end) == Some(&s) && chars.get(end + 1) == Some(&'{')
                    });
                    if !glued {
                        out.push(name);
                    }
                    i = end;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    out
}

fn skip_chars_string(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn skip_chars_interpolation(chars: &[char], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

fn is_escape(chars: &[char], i: usize) -> bool {
    chars.get(i) == Some(&'\\') && chars.get(i + 1).is_some_and(|&c| c != '\n')
}

/// Read a CSS identifier starting at `start`, decoding escapes.
fn read_ident(chars: &[char], start: usize) -> Option<(String, usize)> {
    let first = *chars.get(start)?;
    let starts_ident = match first {
        '-' => chars
            .get(start + 1)
            .is_some_and(|&c| is_name_start(c) || c == '-')
            || is_escape(chars, start + 1),
        '\\' => is_escape(chars, start),
        c => is_name_start(c),
    };
    if !starts_ident {
        return None;
    }

    let mut name = String::new();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if is_escape(chars, i) {
            let (decoded, next) = decode_escape(chars, i + 1);
            name.push(decoded);
            i = next;
        } else if is_name_char(c) {
            name.push(c);
            i += 1;
        } else {
            break;
        }
    }

    Some((name, i))
}

/// Decode the escape body starting right after the backslash.
fn decode_escape(chars: &[char], start: usize) -> (char, usize) {
    let hex_len = chars[start..]
        .iter()
        .take(6)
        .take_while(|c| c.is_ascii_hexdigit())
        .count();
    if hex_len == 0 {
        return (chars[start], start + 1);
    }

    let hex: String = chars[start..start + hex_len].iter().collect();
    let decoded = u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .filter(|&c| c != '\0')
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    let mut end = start + hex_len;
    // A single whitespace terminates a hex escape
    if chars.get(end).is_some_and(|c| c.is_whitespace()) {
        end += 1;
    }
    (decoded, end)
}
