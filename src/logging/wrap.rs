//! Line wrapping for console messages
//!
//! Wraps a single line greedily at whitespace. Hyphens are never break points,
//! words wider than the column budget are cut at the width, and every produced
//! line is stripped of leading and trailing whitespace.

/// Console wrap width in columns
pub const DEFAULT_WIDTH: usize = 60;

const TAB_SIZE: usize = 8;

/// Wrap a line at the default width
pub fn wrap(line: &str) -> Vec<String> {
    Wrapper::default().wrap(line)
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split text into lines at every line boundary
///
/// Boundaries are `\n`, `\r`, `\r\n`, vertical tab, form feed, the ASCII file,
/// group and record separators, NEL, and U+2028/U+2029. A trailing boundary
/// does not start another line, so empty text has no lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !is_line_boundary(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(_, '\n')) = chars.peek() {
                chars.next();
                start += 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Greedy whitespace wrapper with a fixed width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrapper {
    width: usize,
}

impl Default for Wrapper {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
        }
    }
}

struct Chunk {
    text: String,
    len: usize,
    space: bool,
}

impl Chunk {
    /// Cut the first `n` characters off this chunk
    fn split_front(&mut self, n: usize) -> Chunk {
        let at = self
            .text
            .char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
        let tail = self.text.split_off(at);
        let head = std::mem::replace(&mut self.text, tail);
        let head_len = n.min(self.len);
        self.len -= head_len;
        Chunk {
            text: head,
            len: head_len,
            space: self.space,
        }
    }
}

impl Wrapper {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Wrap one line of text
    ///
    /// Never returns an empty vector: blank input yields a single empty line.
    pub fn wrap(&self, line: &str) -> Vec<String> {
        let mut chunks = split_chunks(&expand_tabs(line));
        chunks.reverse();

        let mut lines = Vec::new();
        while !chunks.is_empty() {
            if chunks.last().is_some_and(|c| c.space) {
                chunks.pop();
            }

            let mut current: Vec<Chunk> = Vec::new();
            let mut current_len = 0;
            while let Some(chunk) = chunks.last() {
                if current_len + chunk.len > self.width {
                    break;
                }
                current_len += chunk.len;
                if let Some(chunk) = chunks.pop() {
                    current.push(chunk);
                }
            }

            if let Some(chunk) = chunks.last_mut() {
                if chunk.len > self.width {
                    let head = chunk.split_front(self.width - current_len);
                    if chunk.len == 0 {
                        chunks.pop();
                    }
                    current.push(head);
                }
            }

            let joined: String = current.iter().map(|c| c.text.as_str()).collect();
            let trimmed = joined.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }

        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + TAB_SIZE);
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_SIZE - column % TAB_SIZE;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

fn split_chunks(line: &str) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    for c in line.chars() {
        let space = c.is_whitespace();
        match chunks.last_mut() {
            Some(chunk) if chunk.space == space => {
                chunk.text.push(c);
                chunk.len += 1;
            }
            _ => chunks.push(Chunk {
                text: c.to_string(),
                len: 1,
                space,
            }),
        }
    }
    chunks
}
