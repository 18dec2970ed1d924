/// Maximum length of a generated branch name.
pub const MAX_BRANCH_LEN: usize = 32;

/// Longest suffix the branch editor accepts from typing.
pub const MAX_SUFFIX_LEN: usize = 50;

/// Used only when both the identifier and the free text sanitize to nothing.
const FALLBACK_NAME: &str = "branch";

/// Characters a branch name may never end with.
const TRAILING_JUNK: &[char] = &['-', '.', '/'];

/// Git refuses any ref component ending in this.
const LOCK_SUFFIX: &str = ".lock";

/// Build a valid branch name from an issue identifier and a free-text title.
///
/// The identifier is lowercased and leads the name; the title is slugified
/// (lowercase, spaces become hyphens, anything outside `[a-z0-9-_./]` is
/// dropped, runs of hyphens collapse, runs of dots become a hyphen) and
/// appended after a hyphen. The result never exceeds [`MAX_BRANCH_LEN`]
/// characters: the title is cut first, and an identifier that is already too
/// long is returned truncated on its own.
pub fn sanitize(identifier: &str, free_text: &str) -> String {
    let identifier = sanitize_identifier(identifier);
    let text = sanitize_suffix(free_text);

    if identifier.is_empty() {
        let text = text.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
        let text = truncate(text, MAX_BRANCH_LEN);
        return if text.is_empty() {
            FALLBACK_NAME.to_string()
        } else {
            text
        };
    }

    if identifier.len() >= MAX_BRANCH_LEN {
        return truncate(&identifier, MAX_BRANCH_LEN);
    }

    if text.is_empty() {
        return identifier;
    }

    // -1 for the hyphen joining identifier and text
    let room = MAX_BRANCH_LEN - identifier.len() - 1;
    let text = truncate(&text, room);
    if text.is_empty() {
        return identifier;
    }

    format!("{}-{}", identifier, text)
}

/// Slugify free text without joining it to an identifier or truncating it.
pub fn sanitize_suffix(text: &str) -> String {
    let slug = slugify(text);
    harden_end(slug.trim_start_matches('-'))
}

/// Lighter pass run on the editor buffer after every keystroke.
///
/// Same character rules as [`sanitize_suffix`], but the end of the buffer is
/// left alone so a word separator or a dot can be typed before the next
/// character arrives.
pub fn sanitize_live(text: &str) -> String {
    slugify(text).trim_start_matches('-').to_string()
}

fn sanitize_identifier(identifier: &str) -> String {
    let slug = slugify(identifier);
    harden_end(slug.trim_start_matches(|c: char| !c.is_ascii_alphanumeric()))
}

/// Cut an already-sanitized (ASCII) string to `max` bytes and drop whatever
/// separator or `.lock` ending was left at the new end.
fn truncate(s: &str, max: usize) -> String {
    let cut = if s.len() > max { &s[..max] } else { s };
    harden_end(cut)
}

/// Trim trailing separators and `.lock` component endings until neither is
/// left; removing one can expose the other.
fn harden_end(s: &str) -> String {
    let mut out = s.to_string();
    loop {
        let next = strip_lock_suffixes(out.trim_end_matches(TRAILING_JUNK));
        if next == out {
            return out;
        }
        out = next;
    }
}

/// Drop `.lock` from the end of every `/`-separated component.
fn strip_lock_suffixes(s: &str) -> String {
    s.split('/')
        .map(|component| {
            let mut component = component;
            while let Some(rest) = component.strip_suffix(LOCK_SUFFIX) {
                component = rest;
            }
            component
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn slugify(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' { '-' } else { c })
        // Non-ASCII goes first so multi-byte sequences never leave fragments.
        .filter(|c| c.is_ascii())
        .filter(|c| is_allowed(*c))
        .collect();
    collapse(&lowered)
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.' | '/')
}

fn collapse(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '.' {
            let run = chars[i..].iter().take_while(|&&ch| ch == '.').count();
            i += run;
            if run > 1 {
                push_hyphen(&mut out);
            } else if !out.ends_with('/') {
                out.push('.');
            }
            continue;
        }

        match c {
            '-' => push_hyphen(&mut out),
            '/' if out.ends_with('/') => {}
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

fn push_hyphen(out: &mut String) {
    if !out.ends_with('-') {
        out.push('-');
    }
}

/// A branch name being edited: the sanitized identifier is a locked prefix,
/// the suffix is free to edit and is re-sanitized after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNameDraft {
    prefix: String,
    suffix: String,
    cursor: usize,
}

impl BranchNameDraft {
    pub fn new(identifier: &str, title: &str) -> Self {
        let suffix = sanitize_suffix(title);
        let cursor = suffix.len();
        Self {
            prefix: sanitize(identifier, ""),
            suffix,
            cursor,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Byte offset of the cursor inside the suffix. The suffix is always
    /// ASCII between edits, so this is also the column.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert(&mut self, c: char) {
        if self.suffix.len() >= MAX_SUFFIX_LEN {
            return;
        }
        self.suffix.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.resanitize();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.suffix.remove(self.cursor);
        self.resanitize();
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.suffix.len() {
            return;
        }
        self.suffix.remove(self.cursor);
        self.resanitize();
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.suffix.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.suffix.len();
    }

    pub fn clear(&mut self) {
        self.suffix.clear();
        self.cursor = 0;
    }

    /// The branch name this draft commits to.
    pub fn commit(&self) -> String {
        sanitize(&self.prefix, &self.suffix)
    }

    fn resanitize(&mut self) {
        let cleaned = sanitize_live(&self.suffix);
        if cleaned == self.suffix {
            return;
        }
        let before_cursor = sanitize_live(&self.suffix[..self.cursor]);
        self.cursor = before_cursor.len().min(cleaned.len());
        self.suffix = cleaned;
    }
}
