//! Parse-Mode Text Escaping
//!
//! Each Telegram parse mode reserves a different set of characters. The
//! escaper is a closed enum dispatched to one pure function per mode.
//!
//! Output is wrapped in [`EscapedText`], which can only be built here, so a
//! string cannot be escaped twice on its way to the delivery client.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Characters reserved by Telegram `MarkdownV2`.
pub const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Characters reserved by legacy Telegram `Markdown`.
pub const MARKDOWN_RESERVED: &[char] = &['_', '*', '`', '['];

/// Characters rewritten to entities in `HTML` mode.
pub const HTML_RESERVED: &[char] = &['&', '<', '>'];

/// Markup dialect of the destination chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseMode {
    MarkdownV2,
    Markdown,
    Html,
    /// Plain text; also used for any mode name we do not recognise.
    #[default]
    None,
}

impl ParseMode {
    /// Parse a stored mode name. Unknown names degrade to [`ParseMode::None`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "markdownv2" => Self::MarkdownV2,
            "markdown" => Self::Markdown,
            "html" => Self::Html,
            _ => Self::None,
        }
    }

    /// Value of the Bot API `parse_mode` field, `None` for plain text.
    pub const fn api_name(self) -> Option<&'static str> {
        match self {
            Self::MarkdownV2 => Some("MarkdownV2"),
            Self::Markdown => Some("Markdown"),
            Self::Html => Some("HTML"),
            Self::None => None,
        }
    }

    /// Characters this mode rewrites.
    pub const fn reserved(self) -> &'static [char] {
        match self {
            Self::MarkdownV2 => MARKDOWN_V2_RESERVED,
            Self::Markdown => MARKDOWN_RESERVED,
            Self::Html => HTML_RESERVED,
            Self::None => &[],
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name().unwrap_or("None"))
    }
}

impl Serialize for ParseMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ParseMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.as_deref().map_or(Self::None, Self::from_name))
    }
}

/// Text that has been escaped for exactly one parse mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapedText {
    text: String,
    mode: ParseMode,
}

impl EscapedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub const fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Length in characters, which is what the Bot API limits.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for EscapedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Escape `text` for `mode`.
pub fn escape(mode: ParseMode, text: &str) -> EscapedText {
    let text = match mode {
        ParseMode::MarkdownV2 => backslash_escape(text, MARKDOWN_V2_RESERVED),
        ParseMode::Markdown => backslash_escape(text, MARKDOWN_RESERVED),
        ParseMode::Html => escape_html(text),
        ParseMode::None => text.to_owned(),
    };
    EscapedText { text, mode }
}

fn backslash_escape(text: &str, reserved: &[char]) -> String {
    let mut result = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        if reserved.contains(&ch) {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(ch),
        }
    }
    result
}
