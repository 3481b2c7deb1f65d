//! Title matching and link rewriting.
//!
//! A mention of a title becomes a Markdown link to the article:
//! `Rust` → `[Rust](/articles/rust)`. Brackets and backslashes in the link
//! text are escaped so the written link always parses back as one.
//!
//! Never rewritten: text inside Markdown links and images, code spans,
//! autolinks, inline HTML tags, and bare `scheme://` or `www.` URLs. Since
//! every written link is itself protected, the rewrite is idempotent.

use std::borrow::Cow;
use std::ops::Range;

use regex::Regex;

/// Compiled matcher for one title/slug pair.
///
/// Built once per backlink pass and shared by every worker.
#[derive(Debug, Clone)]
pub struct TitleMatcher {
    pattern: Regex,
    slug: String,
    word_start: bool,
    word_end: bool,
}

impl TitleMatcher {
    /// Returns `None` when there is nothing to link: blank title or slug.
    pub fn new(title: &str, slug: &str) -> Option<Self> {
        let title = title.trim();
        let slug = slug.trim();
        if title.is_empty() || slug.is_empty() {
            return None;
        }

        let pattern = Regex::new(&format!("(?i){}", regex::escape(title))).ok()?;
        let word_start = title.chars().next().is_some_and(is_word_char);
        let word_end = title.chars().next_back().is_some_and(is_word_char);

        Some(Self {
            pattern,
            slug: slug.to_string(),
            word_start,
            word_end,
        })
    }

    /// Link target written into rewritten content.
    pub fn href(&self) -> String {
        format!("/articles/{}", self.slug)
    }

    /// Wrap every eligible mention of the title in a link.
    ///
    /// Returns `Cow::Borrowed` when nothing changed.
    pub fn link<'a>(&self, content: &'a str) -> Cow<'a, str> {
        let protected = protected_ranges(content);
        let href = self.href();

        let mut out = String::new();
        let mut last = 0;
        let mut pos = 0;

        while pos <= content.len() {
            let Some(m) = self.pattern.find_at(content, pos) else {
                break;
            };

            if let Some(range) = overlapping(&protected, m.range()) {
                pos = range.end;
                continue;
            }

            if !self.on_word_boundary(content, m.range()) {
                pos = m.start() + content[m.start()..].chars().next().map_or(1, char::len_utf8);
                continue;
            }

            out.push_str(&content[last..m.start()]);
            out.push('[');
            push_label(&mut out, m.as_str());
            out.push_str("](");
            out.push_str(&href);
            out.push(')');
            last = m.end();
            pos = m.end();
        }

        if last == 0 {
            return Cow::Borrowed(content);
        }
        out.push_str(&content[last..]);
        Cow::Owned(out)
    }

    fn on_word_boundary(&self, content: &str, range: Range<usize>) -> bool {
        if self.word_start && content[..range.start].chars().next_back().is_some_and(is_word_char)
        {
            return false;
        }
        if self.word_end && content[range.end..].chars().next().is_some_and(is_word_char) {
            return false;
        }
        true
    }
}

/// Link every eligible mention of `title` in `content` to `/articles/<slug>`.
pub fn link_title<'a>(content: &'a str, title: &str, slug: &str) -> Cow<'a, str> {
    match TitleMatcher::new(title, slug) {
        Some(matcher) => matcher.link(content),
        None => Cow::Borrowed(content),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Link text with Markdown's bracket and backslash metacharacters escaped.
fn push_label(out: &mut String, text: &str) {
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// First protected range intersecting `span`, if any. `ranges` is sorted
/// and non-overlapping.
fn overlapping(ranges: &[Range<usize>], span: Range<usize>) -> Option<&Range<usize>> {
    let idx = ranges.partition_point(|r| r.end <= span.start);
    ranges.get(idx).filter(|r| r.start < span.end)
}

/// Byte ranges that must not be rewritten, sorted and non-overlapping.
fn protected_ranges(content: &str) -> Vec<Range<usize>> {
    let bytes = content.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let run = run_length(bytes, i, b'`');
                match closing_run(bytes, i + run, run) {
                    Some(close) => {
                        ranges.push(i..close + run);
                        i = close + run;
                    }
                    None => i += run,
                }
            }
            b'[' => match link_end(bytes, i) {
                Some(end) => {
                    let start = if i > 0 && bytes[i - 1] == b'!' { i - 1 } else { i };
                    ranges.push(start..end);
                    i = end;
                }
                None => i += 1,
            },
            b'<' => match autolink_end(bytes, i).or_else(|| html_tag_end(bytes, i)) {
                Some(end) => {
                    ranges.push(i..end);
                    i = end;
                }
                None => i += 1,
            },
            c if c.is_ascii_alphabetic() && (i == 0 || !is_word_byte(bytes[i - 1])) => {
                match bare_url_end(bytes, i) {
                    Some(end) => {
                        ranges.push(i..end);
                        i = end;
                    }
                    None => i += 1,
                }
            }
            _ => i += 1,
        }
    }

    ranges
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || !b.is_ascii()
}

/// Length of a URI scheme (`[A-Za-z][A-Za-z0-9+.-]*`) at the start of `bytes`.
fn scheme_length(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(c) if c.is_ascii_alphabetic() => bytes
            .iter()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, b'+' | b'.' | b'-'))
            .count(),
        _ => 0,
    }
}

/// End (exclusive) of `<scheme:...>` or `<user@host>` opening at `open`.
fn autolink_end(bytes: &[u8], open: usize) -> Option<usize> {
    let close = open + 1 + bytes[open + 1..].iter().position(|&c| c == b'>')?;
    let inner = &bytes[open + 1..close];
    if inner.is_empty() || inner.iter().any(|&c| c.is_ascii_whitespace() || c == b'<') {
        return None;
    }

    let scheme = scheme_length(inner);
    let uri = (2..=32).contains(&scheme) && inner.get(scheme) == Some(&b':');
    let email = inner.iter().position(|&c| c == b'@').is_some_and(|at| at > 0);
    (uri || email).then_some(close + 1)
}

/// End (exclusive) of an inline HTML tag such as `<span class="x">` or
/// `</div>` opening at `open`. Tags do not span lines.
fn html_tag_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut j = open + 1;
    if bytes.get(j) == Some(&b'/') {
        j += 1;
    }
    if !bytes.get(j)?.is_ascii_alphabetic() {
        return None;
    }
    while bytes.get(j).is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'-') {
        j += 1;
    }
    match bytes.get(j)? {
        b'>' => return Some(j + 1),
        c if c.is_ascii_whitespace() || *c == b'/' => {}
        _ => return None,
    }
    let close = j + bytes[j..].iter().position(|&c| c == b'>' || c == b'\n')?;
    (bytes[close] == b'>').then_some(close + 1)
}

/// End (exclusive) of a bare `scheme://...` or `www.` URL starting at
/// `start`. Trailing punctuation and unbalanced closing parentheses are left
/// outside the URL.
fn bare_url_end(bytes: &[u8], start: usize) -> Option<usize> {
    let rest = &bytes[start..];
    let scheme = scheme_length(rest);
    let body = if scheme > 0 && rest[scheme..].starts_with(b"://") {
        scheme + 3
    } else if rest.len() >= 4 && rest[..4].eq_ignore_ascii_case(b"www.") {
        4
    } else {
        return None;
    };

    let mut end = body
        + rest[body..]
            .iter()
            .take_while(|&&c| !c.is_ascii_whitespace() && c != b'<')
            .count();

    while end > body {
        let url = &rest[..end];
        let trim = match url[end - 1] {
            b'.' | b',' | b':' | b';' | b'!' | b'?' | b'"' | b'\'' | b'*' | b'_' | b'~' => true,
            b')' => count(url, b')') > count(url, b'('),
            _ => false,
        };
        if !trim {
            break;
        }
        end -= 1;
    }

    (end > body).then_some(start + end)
}

fn count(bytes: &[u8], b: u8) -> usize {
    bytes.iter().filter(|&&c| c == b).count()
}

fn run_length(bytes: &[u8], start: usize, b: u8) -> usize {
    bytes[start..].iter().take_while(|&&c| c == b).count()
}

/// Start of the next backtick run of exactly `len` backticks.
fn closing_run(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let run = run_length(bytes, j, b'`');
            if run == len {
                return Some(j);
            }
            j += run;
        } else {
            j += 1;
        }
    }
    None
}

/// End (exclusive) of an inline link `[text](dest)` opening at `open`.
fn link_end(bytes: &[u8], open: usize) -> Option<usize> {
    let close_bracket = matching(bytes, open, b'[', b']')?;
    if bytes.get(close_bracket + 1) != Some(&b'(') {
        return None;
    }
    let close_paren = matching(bytes, close_bracket + 1, b'(', b')')?;
    Some(close_paren + 1)
}

/// Index of the delimiter closing the one at `open`, honoring nesting and
/// backslash escapes.
fn matching(bytes: &[u8], open: usize, left: u8, right: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut j = open;
    while j < bytes.len() {
        let c = bytes[j];
        if c == b'\\' {
            j += 2;
            continue;
        }
        if c == left {
            depth += 1;
        } else if c == right {
            depth -= 1;
            if depth == 0 {
                return Some(j);
            }
        }
        j += 1;
    }
    None
}
