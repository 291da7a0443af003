use super::cleanup::{cleanup_efficiency, diff_chars};
use super::{Highlighter, InlineDiffOptions, Segment};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// First code point of the placeholder pool (Supplementary Private Use Area-B)
const PLACEHOLDER_BEGIN: u32 = 0x10_0000;
const CLOSE_SPAN: &str = "</span>";

enum HtmlToken<'a> {
    Found {
        before: &'a str,
        token: &'a str,
        after: &'a str,
    },
    /// No tag or entity left
    End,
    /// A `<` or `&` with no terminator
    Unterminated,
}

fn extract_html_token(s: &str) -> HtmlToken<'_> {
    let Some(start) = s.find(['<', '&']) else {
        return HtmlToken::End;
    };
    let (before, rest) = s.split_at(start);
    let terminator = if rest.starts_with('<') { '>' } else { ';' };
    match rest.find(terminator) {
        Some(end) => HtmlToken::Found {
            before,
            token: &rest[..=end],
            after: &rest[end + 1..],
        },
        None => HtmlToken::Unterminated,
    }
}

/// Diffs two highlighted snippets without breaking their markup.
///
/// One instance holds a placeholder table shared by both sides of a single
/// comparison, so equal tags map to equal characters. Closing tags are keyed
/// together with the tag they close, which keeps `</span>` of one class from
/// matching `</span>` of another.
#[derive(Debug)]
pub struct HighlightCodeDiff {
    placeholder_max_count: u32,
    edit_cost: usize,
    placeholder_index: u32,
    token_placeholders: HashMap<String, char>,
    placeholder_tokens: HashMap<char, String>,
    /// Pool code points that occur in the source text itself
    reserved: HashSet<char>,
    line_wrapper_tags: Option<Vec<String>>,
    overflow_count: usize,
}

impl HighlightCodeDiff {
    #[must_use]
    pub fn new(options: &InlineDiffOptions) -> Self {
        Self {
            placeholder_max_count: options.placeholder_max_count,
            edit_cost: options.edit_cost,
            placeholder_index: 0,
            token_placeholders: HashMap::new(),
            placeholder_tokens: HashMap::new(),
            reserved: HashSet::new(),
            line_wrapper_tags: None,
            overflow_count: 0,
        }
    }

    /// Line wrapper tags stripped from the first highlighted snippet
    #[must_use]
    pub fn line_wrapper_tags(&self) -> &[String] {
        self.line_wrapper_tags.as_deref().unwrap_or_default()
    }

    /// Tokens that could not be given a placeholder
    #[must_use]
    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    /// Highlight both snippets and diff the resulting HTML.
    ///
    /// Concatenating the equal and deleted segments yields the old side,
    /// the equal and inserted segments the new side. Every segment is
    /// balanced HTML on its own.
    pub fn diff_with_highlight(
        &mut self,
        file_name: &str,
        language: Option<&str>,
        code_a: &str,
        code_b: &str,
        highlighter: &dyn Highlighter,
    ) -> Vec<Segment> {
        self.collect_used_runes(code_a);
        self.collect_used_runes(code_b);

        let a = self.convert_to_placeholders(&highlighter.code(file_name, language, code_a));
        let b = self.convert_to_placeholders(&highlighter.code(file_name, language, code_b));

        let mut segments = cleanup_efficiency(diff_chars(&a, &b), self.edit_cost);
        for segment in &mut segments {
            segment.text = self.recover(&segment.text);
        }
        segments
    }

    fn in_pool(&self, c: char) -> bool {
        let c = u32::from(c);
        c >= PLACEHOLDER_BEGIN && c - PLACEHOLDER_BEGIN < self.placeholder_max_count
    }

    fn collect_used_runes(&mut self, code: &str) {
        let used: Vec<char> = code.chars().filter(|&c| self.in_pool(c)).collect();
        self.reserved.extend(used);
    }

    fn next_placeholder(&mut self) -> Option<char> {
        while self.placeholder_index < self.placeholder_max_count {
            let candidate = char::from_u32(PLACEHOLDER_BEGIN + self.placeholder_index);
            self.placeholder_index += 1;
            if let Some(c) = candidate
                && !self.reserved.contains(&c)
                && !self.placeholder_tokens.contains_key(&c)
            {
                return Some(c);
            }
        }
        None
    }

    fn placeholder_for(&mut self, key: &str) -> Option<char> {
        if let Some(&c) = self.token_placeholders.get(key) {
            return Some(c);
        }
        let c = self.next_placeholder()?;
        self.token_placeholders.insert(key.to_string(), c);
        self.placeholder_tokens.insert(c, key.to_string());
        Some(c)
    }

    fn convert_to_placeholders(&mut self, html: &str) -> String {
        let first_run = self.line_wrapper_tags.is_none();
        let mut wrappers = Vec::new();
        let mut open_tags: Vec<String> = Vec::new();
        let mut out = String::with_capacity(html.len());
        let mut rest = html;

        while let HtmlToken::Found {
            before,
            token,
            after,
        } = extract_html_token(rest)
        {
            out.push_str(before);
            rest = after;

            if token.starts_with(r#"<span class="line"#) || token.starts_with(r#"<span class="cl""#) {
                if first_run {
                    wrappers.push(token.to_string());
                }
                rest = rest.strip_suffix(CLOSE_SPAN).unwrap_or(rest);
                continue;
            }

            let key = if token.starts_with("</") {
                // A close with nothing open means the markup is broken; keep the rest verbatim
                let Some(open) = open_tags.pop() else {
                    break;
                };
                format!("{token}<!-- {open}-->")
            } else {
                if token.starts_with('<') {
                    open_tags.push(token.to_string());
                }
                token.to_string()
            };

            match self.placeholder_for(&key) {
                Some(c) => out.push(c),
                None => {
                    self.overflow_count += 1;
                    trace!(token, "placeholder pool exhausted");
                    if let Some(body) = token.strip_prefix('&') {
                        out.push('\u{FFFD}');
                        out.push_str(body);
                    }
                }
            }
        }
        out.push_str(rest);

        if first_run {
            self.line_wrapper_tags = Some(wrappers);
        }
        out
    }

    fn recover(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut open_tags: Vec<&str> = Vec::new();

        for c in text.chars() {
            let Some(token) = self.placeholder_tokens.get(&c) else {
                out.push(c);
                continue;
            };
            if token.starts_with("</") {
                if open_tags.pop().is_none() {
                    continue;
                }
                let end = token.find('>').map_or(token.len(), |i| i + 1);
                out.push_str(&token[..end]);
            } else {
                if token.starts_with('<') {
                    open_tags.push(token);
                }
                out.push_str(token);
            }
        }

        for tag in open_tags.iter().rev() {
            if let Some(end) = tag.find([' ', '>']) {
                out.push_str("</");
                out.push_str(&tag[1..end]);
                out.push('>');
            }
        }
        out
    }
}
