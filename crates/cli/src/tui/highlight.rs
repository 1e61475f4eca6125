//! Keyword highlighting for Solidity and Vyper sources

use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};
use sneko_core::Language;

const SOLIDITY_KEYWORDS: &[&str] = &[
    "abstract", "anonymous", "assembly", "assert", "break", "calldata", "catch", "constant",
    "constructor", "continue", "contract", "delete", "do", "else", "emit", "enum", "error",
    "event", "external", "fallback", "false", "for", "function", "if", "immutable", "import",
    "indexed", "interface", "internal", "is", "let", "library", "memory", "modifier", "new",
    "override", "payable", "pragma", "private", "public", "pure", "receive", "require",
    "return", "returns", "revert", "solidity", "storage", "struct", "this", "true", "try",
    "unchecked", "using", "view", "virtual", "while",
];

const VYPER_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "break", "constant", "continue", "def",
    "elif", "else", "empty", "event", "external", "for", "from", "if", "immutable",
    "implements", "import", "in", "indexed", "interface", "internal", "log", "nonpayable",
    "not", "or", "pass", "payable", "public", "pure", "raise", "range", "return", "self",
    "struct", "view",
];

const SOLIDITY_TYPES: &[&str] = &["address", "bool", "byte", "mapping", "string"];
const VYPER_TYPES: &[&str] = &["Bytes", "DynArray", "HashMap", "String", "address", "bool", "decimal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Plain,
    Keyword,
    Type,
    Number,
    Str,
    Comment,
    Decorator,
}

impl Class {
    fn style(self) -> Style {
        match self {
            Class::Plain => Style::default(),
            Class::Keyword => Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            Class::Type => Style::default().fg(Color::Cyan),
            Class::Number => Style::default().fg(Color::LightRed),
            Class::Str => Style::default().fg(Color::Green),
            Class::Comment => Style::default().fg(Color::DarkGray),
            Class::Decorator => Style::default().fg(Color::LightBlue),
        }
    }
}

/// `uint`, `uint8` ... `uint256`, and the same for `int` and `bytes`
fn is_sized_type(word: &str) -> bool {
    ["uint", "int", "bytes", "ufixed", "fixed"].iter().any(|prefix| {
        word.strip_prefix(prefix)
            .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit() || c == 'x'))
    })
}

fn classify(word: &str, language: Language) -> Class {
    let (keywords, types) = match language {
        Language::Solidity => (SOLIDITY_KEYWORDS, SOLIDITY_TYPES),
        Language::Vyper => (VYPER_KEYWORDS, VYPER_TYPES),
    };
    if keywords.contains(&word) {
        Class::Keyword
    } else if types.contains(&word) || is_sized_type(word) {
        Class::Type
    } else {
        Class::Plain
    }
}

/// Splits every line of `lines` into styled spans
///
/// Block comments and Vyper docstrings carry over from one line to the next.
pub fn highlight(lines: &[String], language: Option<Language>) -> Vec<Vec<Span<'static>>> {
    let Some(language) = language else {
        return lines.iter().map(|l| vec![Span::raw(l.clone())]).collect();
    };

    let mut open_block: Option<&'static str> = None;
    lines
        .iter()
        .map(|line| highlight_line(line, language, &mut open_block))
        .collect()
}

fn highlight_line(
    line: &str,
    language: Language,
    open_block: &mut Option<&'static str>,
) -> Vec<Span<'static>> {
    let chars: Vec<char> = line.chars().collect();
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    let push = |spans: &mut Vec<Span<'static>>, plain: &mut String, text: String, class| {
        if !plain.is_empty() {
            spans.push(Span::raw(std::mem::take(plain)));
        }
        if !text.is_empty() {
            spans.push(Span::styled(text, Class::style(class)));
        }
    };
    let starts_with = |at: usize, pat: &str| chars[at..].iter().copied().take(pat.len()).eq(pat.chars());

    while i < chars.len() {
        if let Some(end) = *open_block {
            let close = (i..chars.len()).find(|&j| starts_with(j, end));
            let stop = close.map_or(chars.len(), |j| j + end.len());
            push(&mut spans, &mut plain, chars[i..stop].iter().collect(), Class::Comment);
            if close.is_some() {
                *open_block = None;
            }
            i = stop;
            continue;
        }

        let c = chars[i];
        let line_comment = match language {
            Language::Solidity => starts_with(i, "//"),
            Language::Vyper => c == '#',
        };
        if line_comment {
            push(&mut spans, &mut plain, chars[i..].iter().collect(), Class::Comment);
            break;
        }

        let block_start = match language {
            Language::Solidity if starts_with(i, "/*") => Some(("/*", "*/")),
            Language::Vyper if starts_with(i, "\"\"\"") => Some(("\"\"\"", "\"\"\"")),
            _ => None,
        };
        if let Some((start, end)) = block_start {
            push(&mut spans, &mut plain, start.to_string(), Class::Comment);
            *open_block = Some(end);
            i += start.len();
            continue;
        }

        if c == '"' || c == '\'' {
            let mut j = i + 1;
            while j < chars.len() && chars[j] != c {
                j += if chars[j] == '\\' { 2 } else { 1 };
            }
            let stop = (j + 1).min(chars.len());
            push(&mut spans, &mut plain, chars[i..stop].iter().collect(), Class::Str);
            i = stop;
            continue;
        }

        if c.is_ascii_digit() {
            let stop = (i..chars.len())
                .find(|&j| !(chars[j].is_ascii_alphanumeric() || chars[j] == '_' || chars[j] == '.'))
                .unwrap_or(chars.len());
            push(&mut spans, &mut plain, chars[i..stop].iter().collect(), Class::Number);
            i = stop;
            continue;
        }

        let decorator = language == Language::Vyper && c == '@';
        if c.is_alphabetic() || c == '_' || c == '$' || decorator {
            let stop = (i + 1..chars.len())
                .find(|&j| !(chars[j].is_alphanumeric() || chars[j] == '_' || chars[j] == '$'))
                .unwrap_or(chars.len());
            let word: String = chars[i..stop].iter().collect();
            let class = if decorator {
                Class::Decorator
            } else {
                classify(&word, language)
            };
            if class == Class::Plain {
                plain.push_str(&word);
            } else {
                push(&mut spans, &mut plain, word, class);
            }
            i = stop;
            continue;
        }

        plain.push(c);
        i += 1;
    }

    if !plain.is_empty() {
        spans.push(Span::raw(plain));
    }
    spans
}
