//! Ordered, untyped `key=value` store with Java-properties syntax.
//!
//! Parsing understands `#`/`!` comments, `=`, `:` or whitespace separators,
//! backslash escapes (including `\uXXXX`) and line continuations. Comment
//! lines stay attached to the key that follows them; comments before the
//! first key form the header. Blank lines are not preserved. Serializing
//! with [`Display`](fmt::Display) writes one `key=value` line per entry in
//! the original order.

use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::str::FromStr;

/// A syntax error in a properties document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
    comments: Vec<String>,
}

/// In-memory copy of a settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesStore {
    header: Vec<String>,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    trailing: Vec<String>,
}

impl PropertiesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].value.as_str())
    }

    /// Sets `key`, keeping its position if it exists and appending otherwise.
    /// Returns the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].value, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(Entry {
                    key,
                    value,
                    comments: Vec::new(),
                });
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Replaces the header comment block; `lines` are written after a `#`.
    pub fn set_header(&mut self, lines: Vec<String>) {
        self.header = lines.into_iter().map(|line| format!("#{line}")).collect();
    }

    /// Header comment lines, including their comment marker.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut store = Self::new();
        let mut pending_comments = Vec::new();
        let mut seen_entry = false;
        let mut lines = text.lines().enumerate();

        while let Some((number, raw)) = lines.next() {
            let line = raw.trim_start_matches(is_blank);
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') || line.starts_with('!') {
                pending_comments.push(line.to_string());
                continue;
            }

            let mut logical = line.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                    None => break,
                }
            }

            let (key, value) = split_key_value(&logical);
            let key = unescape(key).map_err(|message| ParseError {
                line: number + 1,
                message,
            })?;
            let value = unescape(value).map_err(|message| ParseError {
                line: number + 1,
                message,
            })?;

            if !seen_entry {
                store.header = std::mem::take(&mut pending_comments);
                seen_entry = true;
            }
            let comments = std::mem::take(&mut pending_comments);
            match store.index.get(&key) {
                Some(&position) => {
                    let entry = &mut store.entries[position];
                    entry.value = value;
                    entry.comments.extend(comments);
                }
                None => {
                    store.index.insert(key.clone(), store.entries.len());
                    store.entries.push(Entry { key, value, comments });
                }
            }
        }

        if seen_entry {
            store.trailing = pending_comments;
        } else {
            store.header = pending_comments;
        }
        Ok(store)
    }
}

impl FromStr for PropertiesStore {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl fmt::Display for PropertiesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for comment in &self.header {
            writeln!(f, "{comment}")?;
        }
        for entry in &self.entries {
            for comment in &entry.comments {
                writeln!(f, "{comment}")?;
            }
            writeln!(f, "{}={}", escape_key(&entry.key), escape_value(&entry.value))?;
        }
        for comment in &self.trailing {
            writeln!(f, "{comment}")?;
        }
        Ok(())
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (position, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = position;
                break;
            }
            c if is_blank(c) => {
                key_end = position;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches(is_blank);
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    (key, rest.trim_start_matches(is_blank))
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let code = code_unit(&mut chars)?;
                let decoded = if (0xD800..=0xDBFF).contains(&code) {
                    // High surrogate: only valid as the first half of a `\uXXXX\uXXXX` pair.
                    let low = match chars.as_str().strip_prefix("\\u") {
                        Some(_) => {
                            chars.nth(1);
                            code_unit(&mut chars)?
                        }
                        None => 0,
                    };
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(format!("\\u{code:04x} is an unpaired surrogate"));
                    }
                    char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00))
                } else {
                    char::from_u32(code)
                };
                out.push(decoded.ok_or_else(|| format!("\\u{code:04x} is not a valid character"))?);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Reads the four hex digits of a `\\u` escape.
fn code_unit(chars: &mut std::str::Chars<'_>) -> Result<u32, String> {
    let digits: String = chars.by_ref().take(4).collect();
    (digits.len() == 4)
        .then(|| u32::from_str_radix(&digits, 16).ok())
        .flatten()
        .ok_or_else(|| format!("malformed \\u escape `\\u{digits}`"))
}

fn escape_common(c: char, out: &mut String) -> bool {
    match c {
        '\\' => out.push_str("\\\\"),
        '\t' => out.push_str("\\t"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\u{c}' => out.push_str("\\f"),
        _ => return false,
    }
    true
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (position, c) in key.chars().enumerate() {
        if escape_common(c, &mut out) {
            continue;
        }
        match c {
            ' ' | '=' | ':' => {
                let _ = write!(out, "\\{c}");
            }
            '#' | '!' if position == 0 => {
                let _ = write!(out, "\\{c}");
            }
            _ => out.push(c),
        }
    }
    out
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (position, c) in value.chars().enumerate() {
        if escape_common(c, &mut out) {
            continue;
        }
        if position == 0 && c == ' ' {
            out.push_str("\\ ");
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERATED: &str = "\
#Minecraft server properties
#Mon Oct 16 10:00:00 UTC 2023
enable-jmx-monitoring=false
rcon.port=25575
level-seed=
motd=A Minecraft Server
generator-settings={}
max-players=20
";

    #[test]
    fn parses_generated_settings_file_in_order() {
        let store: PropertiesStore = GENERATED.parse().unwrap();

        assert_eq!(store.len(), 6);
        assert_eq!(
            store.keys().collect::<Vec<_>>(),
            ["enable-jmx-monitoring", "rcon.port", "level-seed", "motd", "generator-settings", "max-players"]
        );
        assert_eq!(store.get("motd"), Some("A Minecraft Server"));
        assert_eq!(store.get("level-seed"), Some(""));
        assert_eq!(store.get("generator-settings"), Some("{}"));
        assert_eq!(store.header().len(), 2);
    }

    #[test]
    fn serializes_back_to_identical_text() {
        let store: PropertiesStore = GENERATED.parse().unwrap();
        assert_eq!(store.to_string(), GENERATED);
    }

    #[test]
    fn set_replaces_in_place_and_appends_new_keys() {
        let mut store: PropertiesStore = GENERATED.parse().unwrap();

        assert_eq!(store.set("max-players", "5"), Some("20".to_string()));
        assert_eq!(store.set("difficulty", "hard"), None);

        let keys: Vec<_> = store.keys().collect();
        assert_eq!(keys[5], "max-players");
        assert_eq!(keys[6], "difficulty");
        assert!(store.to_string().ends_with("max-players=5\ndifficulty=hard\n"));
    }

    #[test]
    fn understands_java_properties_syntax() {
        let text = "\
! bang comment
   indented = spaced value
colon:value
whitespace value here
escaped\\ key\\=x=a\\=b
continued=first, \\
    second
unicode=caf\\u00e9
tabs=a\\tb
dup=1
dup=2
";
        let store: PropertiesStore = text.parse().unwrap();

        assert_eq!(store.get("indented"), Some("spaced value"));
        assert_eq!(store.get("colon"), Some("value"));
        assert_eq!(store.get("whitespace"), Some("value here"));
        assert_eq!(store.get("escaped key=x"), Some("a=b"));
        assert_eq!(store.get("continued"), Some("first, second"));
        assert_eq!(store.get("unicode"), Some("café"));
        assert_eq!(store.get("tabs"), Some("a\tb"));
        assert_eq!(store.get("dup"), Some("2"));
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn escaping_survives_a_reparse() {
        let mut store = PropertiesStore::new();
        store.set("motd", " leading space\nand a newline \\ backslash");
        store.set("odd key:=", "value");
        store.set("#hash", "x");

        let reparsed: PropertiesStore = store.to_string().parse().unwrap();
        assert_eq!(reparsed, store);
    }

    #[test]
    fn comments_stay_attached_to_their_key() {
        let text = "#header\na=1\n# about b\nb=2\n#trailing\n";
        let mut store: PropertiesStore = text.parse().unwrap();
        store.set("b", "3");

        assert_eq!(store.to_string(), "#header\na=1\n# about b\nb=3\n#trailing\n");
    }

    #[test]
    fn malformed_unicode_escape_is_rejected() {
        let error = "a=1\nb=\\u12\n".parse::<PropertiesStore>().unwrap_err();
        assert_eq!(error.line, 2);
    }

    #[test]
    fn surrogate_pair_escape_decodes_to_one_character() {
        let store: PropertiesStore = "motd=hi \\ud83d\\ude00\nmax-players=20\n".parse().unwrap();

        assert_eq!(store.get("motd"), Some("hi \u{1F600}"));
        assert_eq!(store.get("max-players"), Some("20"));
        let reparsed: PropertiesStore = store.to_string().parse().unwrap();
        assert_eq!(reparsed, store);
    }

    #[test]
    fn unpaired_surrogate_escape_is_rejected() {
        for text in ["motd=\\ud83d\n", "motd=\\ud83dx\n", "motd=\\ud83d\\u0041\n", "motd=\\ude00\n"] {
            let error = text.parse::<PropertiesStore>().unwrap_err();
            assert_eq!(error.line, 1, "{text:?}");
        }
    }

    #[test]
    fn comment_only_document_keeps_header() {
        let store: PropertiesStore = "#just a comment\n\n".parse().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.to_string(), "#just a comment\n");
    }
}
