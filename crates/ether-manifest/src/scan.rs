//! Delimiter-balance scanning over `Package.swift` source.
//!
//! The scanner never builds a syntax tree. It classifies every byte as code,
//! string literal or comment, then answers a few questions over code bytes
//! only: where a bracket closes, where top-level commas split an argument
//! list, and whether a span is a call or a plain string literal.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Code,
    Str,
    Comment,
}

#[derive(Debug, Clone, Copy)]
struct StrDelim {
    quotes: usize,
    hashes: usize,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Code,
    LineComment,
    BlockComment(usize),
    Str(StrDelim),
}

/// One element of a call's argument list or of an array literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Arg {
    /// `name` in `name: "App"`
    pub label: Option<String>,
    /// The whole element, without surrounding whitespace or comments
    pub span: Range<usize>,
    /// The element after its label
    pub value: Range<usize>,
}

/// A call-shaped expression such as `.package(url: ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub name: String,
    pub open: usize,
    pub close: usize,
}

pub(crate) struct Scanner<'a> {
    src: &'a str,
    class: Vec<Class>,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            class: classify(src.as_bytes()),
        }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn text(&self, range: Range<usize>) -> &'a str {
        &self.src[range]
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn is_code(&self, i: usize) -> bool {
        self.class.get(i) == Some(&Class::Code)
    }

    fn is_trivia(&self, i: usize) -> bool {
        match self.class.get(i) {
            Some(Class::Comment) => true,
            Some(Class::Code) => self.bytes()[i].is_ascii_whitespace(),
            _ => false,
        }
    }

    /// First index at or after `i` that is not whitespace or comment.
    pub fn skip_trivia(&self, mut i: usize, end: usize) -> usize {
        while i < end && self.is_trivia(i) {
            i += 1;
        }
        i
    }

    /// Shrink a range so it starts and ends on meaningful bytes.
    pub fn trim(&self, range: Range<usize>) -> Range<usize> {
        let start = self.skip_trivia(range.start, range.end);
        let mut end = range.end;
        while end > start && self.is_trivia(end - 1) {
            end -= 1;
        }
        start..end
    }

    /// Index of the bracket closing the one at `open`.
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        let b = self.bytes();
        if !self.is_code(open) || !matches!(b.get(open), Some(b'(' | b'[' | b'{')) {
            return None;
        }

        let mut stack = vec![b[open]];
        for i in open + 1..b.len() {
            if !self.is_code(i) {
                continue;
            }
            match b[i] {
                b'(' | b'[' | b'{' => stack.push(b[i]),
                b')' | b']' | b'}' => {
                    let opener = stack.pop()?;
                    if closer_for(opener) != b[i] {
                        return None;
                    }
                    if stack.is_empty() {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Split the contents between `open` and `close` on top-level commas.
    ///
    /// Empty pieces (a trailing comma) are dropped.
    pub fn split_list(&self, open: usize, close: usize) -> Vec<Arg> {
        let b = self.bytes();
        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut start = open + 1;

        for i in open + 1..close {
            if !self.is_code(i) {
                continue;
            }
            match b[i] {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    self.push_arg(&mut args, start..i);
                    start = i + 1;
                }
                _ => {}
            }
        }
        self.push_arg(&mut args, start..close);
        args
    }

    fn push_arg(&self, args: &mut Vec<Arg>, piece: Range<usize>) {
        let span = self.trim(piece);
        if span.is_empty() {
            return;
        }
        let (label, value) = self.label_of(span.clone());
        args.push(Arg { label, span, value });
    }

    fn label_of(&self, span: Range<usize>) -> (Option<String>, Range<usize>) {
        let b = self.bytes();
        let mut i = span.start;
        if i < span.end && is_ident_start(b[i]) {
            while i < span.end && is_ident_char(b[i]) {
                i += 1;
            }
            let ident_end = i;
            let colon = self.skip_trivia(i, span.end);
            if colon < span.end && b[colon] == b':' && self.is_code(colon) {
                let value_start = self.skip_trivia(colon + 1, span.end);
                let label = self.src[span.start..ident_end].to_string();
                return (Some(label), value_start..span.end);
            }
        }
        (None, span)
    }

    /// Read `span` as a call such as `.exact("1.0.0")` or `Package(...)`.
    ///
    /// The call must cover the whole span; `.package(...).foo` is not a call.
    pub fn call_at(&self, span: Range<usize>) -> Option<Call> {
        let b = self.bytes();
        let mut i = span.start;
        if b.get(i) == Some(&b'.') {
            i += 1;
        }
        if i >= span.end || !is_ident_start(b[i]) {
            return None;
        }
        let name_start = i;
        while i < span.end && is_ident_char(b[i]) {
            i += 1;
        }
        let name = self.src[name_start..i].to_string();

        let open = self.skip_trivia(i, span.end);
        if open >= span.end || b[open] != b'(' {
            return None;
        }
        let close = self.matching_close(open)?;
        if close + 1 != span.end {
            return None;
        }
        Some(Call { name, open, close })
    }

    /// Read `span` as a plain single-line string literal, unescaped.
    pub fn string_at(&self, span: Range<usize>) -> Option<String> {
        let text = self.text(span.clone());
        if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') || text.starts_with("\"\"\"")
        {
            return None;
        }
        // interpolation leaves code bytes inside the literal
        if span.clone().any(|i| self.class[i] != Class::Str) {
            return None;
        }
        Some(unescape(&text[1..text.len() - 1]))
    }

    /// The top-level `Package(...)` initializer call.
    pub fn find_package_call(&self) -> Option<Call> {
        let b = self.bytes();
        for (i, _) in self.src.match_indices("Package") {
            if !self.is_code(i) {
                continue;
            }
            if i > 0 && (is_ident_char(b[i - 1]) || b[i - 1] == b'.') {
                continue;
            }
            let after = i + "Package".len();
            if after < b.len() && is_ident_char(b[after]) {
                continue;
            }
            let open = self.skip_trivia(after, b.len());
            if b.get(open) != Some(&b'(') {
                continue;
            }
            if let Some(close) = self.matching_close(open) {
                return Some(Call {
                    name: "Package".to_string(),
                    open,
                    close,
                });
            }
        }
        None
    }

    /// First occurrence of `needle` inside `span` that lies entirely in code.
    pub fn find_code(&self, span: Range<usize>, needle: &str) -> Option<usize> {
        self.text(span.clone())
            .match_indices(needle)
            .map(|(i, _)| span.start + i)
            .find(|&i| (i..i + needle.len()).all(|j| self.is_code(j)))
    }

    /// Index of a comma directly after `end`, skipping whitespace and comments.
    pub fn trailing_comma(&self, end: usize, limit: usize) -> Option<usize> {
        let i = self.skip_trivia(end, limit);
        (i < limit && self.bytes()[i] == b',' && self.is_code(i)).then_some(i)
    }
}

fn classify(b: &[u8]) -> Vec<Class> {
    let mut class = vec![Class::Code; b.len()];
    let mut mode = Mode::Code;
    // strings suspended by `\(`, with the paren depth outside the interpolation
    let mut suspended: Vec<(StrDelim, usize)> = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < b.len() {
        match mode {
            Mode::Code => match b[i] {
                b'/' if b.get(i + 1) == Some(&b'/') => {
                    class[i] = Class::Comment;
                    mode = Mode::LineComment;
                }
                b'/' if b.get(i + 1) == Some(&b'*') => {
                    mark(&mut class, i..i + 2, Class::Comment);
                    i += 2;
                    mode = Mode::BlockComment(1);
                    continue;
                }
                b'"' | b'#' => {
                    if let Some((delim, len)) = string_opener(b, i) {
                        mark(&mut class, i..i + len, Class::Str);
                        i += len;
                        mode = Mode::Str(delim);
                        continue;
                    }
                }
                b'(' if !suspended.is_empty() => depth += 1,
                b')' if !suspended.is_empty() => {
                    if depth == 0 {
                        if let Some((delim, outer)) = suspended.pop() {
                            class[i] = Class::Str;
                            depth = outer;
                            mode = Mode::Str(delim);
                        }
                    } else {
                        depth -= 1;
                    }
                }
                _ => {}
            },
            Mode::LineComment => {
                if b[i] == b'\n' {
                    mode = Mode::Code;
                } else {
                    class[i] = Class::Comment;
                }
            }
            Mode::BlockComment(nesting) => {
                let next = b.get(i + 1).copied();
                if b[i] == b'/' && next == Some(b'*') {
                    mark(&mut class, i..i + 2, Class::Comment);
                    i += 2;
                    mode = Mode::BlockComment(nesting + 1);
                    continue;
                }
                if b[i] == b'*' && next == Some(b'/') {
                    mark(&mut class, i..i + 2, Class::Comment);
                    i += 2;
                    mode = if nesting == 1 {
                        Mode::Code
                    } else {
                        Mode::BlockComment(nesting - 1)
                    };
                    continue;
                }
                class[i] = Class::Comment;
            }
            Mode::Str(delim) => {
                class[i] = Class::Str;
                if b[i] == b'\\' && hashes_at(b, i + 1, delim.hashes) {
                    let after = i + 1 + delim.hashes;
                    let end = (after + 1).min(b.len());
                    mark(&mut class, i..end, Class::Str);
                    if b.get(after) == Some(&b'(') {
                        suspended.push((delim, depth));
                        depth = 0;
                        mode = Mode::Code;
                    }
                    i = end;
                    continue;
                }
                if closes_string(b, i, delim) {
                    let len = delim.quotes + delim.hashes;
                    mark(&mut class, i..i + len, Class::Str);
                    i += len;
                    mode = Mode::Code;
                    continue;
                }
                if b[i] == b'\n' && delim.quotes == 1 {
                    // unterminated single-line literal
                    class[i] = Class::Code;
                    mode = Mode::Code;
                }
            }
        }
        i += 1;
    }

    class
}

fn mark(class: &mut [Class], range: Range<usize>, kind: Class) {
    let end = range.end.min(class.len());
    for c in &mut class[range.start..end] {
        *c = kind;
    }
}

fn string_opener(b: &[u8], i: usize) -> Option<(StrDelim, usize)> {
    let mut j = i;
    while b.get(j) == Some(&b'#') {
        j += 1;
    }
    if b.get(j) != Some(&b'"') {
        return None;
    }
    let hashes = j - i;
    let quotes = if b[j..].starts_with(b"\"\"\"") { 3 } else { 1 };
    Some((StrDelim { quotes, hashes }, hashes + quotes))
}

fn hashes_at(b: &[u8], at: usize, count: usize) -> bool {
    at + count <= b.len() && b[at..at + count].iter().all(|&c| c == b'#')
}

fn closes_string(b: &[u8], i: usize, delim: StrDelim) -> bool {
    let quotes_end = i + delim.quotes;
    quotes_end <= b.len()
        && b[i..quotes_end].iter().all(|&c| c == b'"')
        && hashes_at(b, quotes_end, delim.hashes)
}

fn closer_for(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Start of the line containing `i`.
pub(crate) fn line_start(src: &str, i: usize) -> usize {
    src[..i].rfind('\n').map_or(0, |p| p + 1)
}

/// Index of the newline ending the line containing `i`, or the end of input.
pub(crate) fn line_end(src: &str, i: usize) -> usize {
    src[i..].find('\n').map_or(src.len(), |p| i + p)
}

/// Leading whitespace of the line containing `i`.
pub(crate) fn indent_of(src: &str, i: usize) -> &str {
    let start = line_start(src, i);
    let line = &src[start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &src[start..start + width]
}

/// Whether only whitespace precedes `i` on its line.
pub(crate) fn starts_line(src: &str, i: usize) -> bool {
    src[line_start(src, i)..i].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_of(src: &str, needle: &str) -> usize {
        src.find(needle).unwrap() + needle.len() - 1
    }

    #[test]
    fn test_matching_close_ignores_strings_and_comments() {
        let src = r#"call(a, ")", [1, 2] /* ) */, // ]
            b)"#;
        let scanner = Scanner::new(src);
        assert_eq!(scanner.matching_close(4), Some(src.len() - 1));
    }

    #[test]
    fn test_nested_block_comments() {
        let src = "f(/* outer /* inner ) */ still ) */ x)";
        let scanner = Scanner::new(src);
        assert_eq!(scanner.matching_close(1), Some(src.len() - 1));
    }

    #[test]
    fn test_interpolation_is_code() {
        let src = r#"f("a\(g(")"))b", x)"#;
        let scanner = Scanner::new(src);
        let close = scanner.matching_close(1).unwrap();
        assert_eq!(close, src.len() - 1);

        let args = scanner.split_list(1, close);
        assert_eq!(args.len(), 2);
        assert_eq!(scanner.text(args[1].span.clone()), "x");
        // interpolated literals are not plain strings
        assert_eq!(scanner.string_at(args[0].span.clone()), None);
    }

    #[test]
    fn test_raw_and_multiline_strings() {
        let src = "f(#\"a \"quoted\" )\"#, \"\"\"\n)\n\"\"\", y)";
        let scanner = Scanner::new(src);
        let close = scanner.matching_close(1).unwrap();
        assert_eq!(close, src.len() - 1);
        assert_eq!(scanner.split_list(1, close).len(), 3);
    }

    #[test]
    fn test_split_list_labels() {
        let src = r#"(name: "App", dependencies: ["A", "B",], path : "Sources")"#;
        let scanner = Scanner::new(src);
        let args = scanner.split_list(0, src.len() - 1);
        let labels: Vec<_> = args.iter().map(|a| a.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("name"), Some("dependencies"), Some("path")]);
        assert_eq!(scanner.string_at(args[2].value.clone()).as_deref(), Some("Sources"));

        let list = args[1].value.clone();
        let inner = scanner.split_list(list.start, list.end - 1);
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn test_call_at() {
        let src = r#".upToNextMajor(from: "1.0.0")"#;
        let scanner = Scanner::new(src);
        let call = scanner.call_at(0..src.len()).unwrap();
        assert_eq!(call.name, "upToNextMajor");
        assert_eq!(call.open, open_of(src, "upToNextMajor("));

        let src = r#".package(url: "x").foo"#;
        let scanner = Scanner::new(src);
        assert!(scanner.call_at(0..src.len()).is_none());
    }

    #[test]
    fn test_find_package_call() {
        let src = r#"// swift-tools-version:5.9
import PackageDescription
// Package(fake)
let package = Package(
    name: "Demo"
)
"#;
        let scanner = Scanner::new(src);
        let call = scanner.find_package_call().unwrap();
        assert_eq!(call.open, open_of(src, "= Package("));
        assert_eq!(&src[call.close..call.close + 1], ")");
    }

    #[test]
    fn test_find_code_skips_literals() {
        let src = r#""1...2" /* ..< */ ..< "3""#;
        let scanner = Scanner::new(src);
        assert_eq!(scanner.find_code(0..src.len(), "..."), None);
        assert_eq!(
            scanner.find_code(0..src.len(), "..<"),
            Some(src.rfind("..<").unwrap())
        );
    }

    #[test]
    fn test_string_at_unescapes() {
        let src = r#""a\"b""#;
        let scanner = Scanner::new(src);
        assert_eq!(scanner.string_at(0..src.len()).as_deref(), Some("a\"b"));
    }

    #[test]
    fn test_line_helpers() {
        let src = "a\n    b\n";
        let b = src.find('b').unwrap();
        assert_eq!(line_start(src, b), 2);
        assert_eq!(line_end(src, b), src.len() - 1);
        assert_eq!(indent_of(src, b), "    ");
        assert!(starts_line(src, b));
    }
}
