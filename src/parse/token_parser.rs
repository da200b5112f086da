use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

use crate::model::task::Intent;

/// A whole whitespace-delimited word that is a metadata token.
/// Group 1: tag name, group 2: intent word, group 3: momentum marker.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:#([a-z0-9_-]+)|!(now|soon|later)|!(m))$").unwrap()
});

/// Raw input split into clean text and the metadata its tokens carried
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInput {
    pub text: String,
    /// Lowercase, deduplicated
    pub tags: Vec<String>,
    pub intent: Option<Intent>,
    /// Only ever true: the absence of `!m` never clears momentum
    pub momentum: bool,
}

/// What a single word means to the parser
pub(crate) enum Token<'a> {
    Tag(&'a str),
    Intent(Intent),
    Momentum,
}

/// Classify a whitespace-free word
pub(crate) fn classify(word: &str) -> Option<Token<'_>> {
    let caps = TOKEN_RE.captures(word)?;
    if let Some(tag) = caps.get(1) {
        return Some(Token::Tag(tag.as_str()));
    }
    if let Some(intent) = caps.get(2) {
        return Intent::parse(intent.as_str()).map(Token::Intent);
    }
    caps.get(3).map(|_| Token::Momentum)
}

/// Parse raw task input: `Call mom !soon #family !m`.
///
/// Tokens count only as whole whitespace-delimited words. The first intent
/// token wins; later intent tokens are dropped too so that the returned text
/// never parses to anything again.
pub fn parse_task_input(raw: &str) -> ParsedInput {
    let mut intent = None;
    let mut momentum = false;
    let mut tags: IndexSet<String> = IndexSet::new();
    let mut words = Vec::new();

    for word in raw.split_whitespace() {
        match classify(word) {
            Some(Token::Intent(found)) => {
                intent.get_or_insert(found);
            }
            Some(Token::Momentum) => momentum = true,
            Some(Token::Tag(name)) => {
                tags.insert(name.to_lowercase());
            }
            None => words.push(word),
        }
    }

    ParsedInput {
        text: words.join(" "),
        tags: tags.into_iter().collect(),
        intent,
        momentum,
    }
}

/// Pull only `#tag` tokens out of `text`, leaving intent and momentum
/// tokens alone. Text without tags is returned byte-for-byte.
pub fn strip_tag_tokens(text: &str) -> (String, Vec<String>) {
    let mut tags: IndexSet<String> = IndexSet::new();
    let mut words = Vec::new();
    for word in text.split_whitespace() {
        match classify(word) {
            Some(Token::Tag(name)) => {
                tags.insert(name.to_lowercase());
            }
            _ => words.push(word),
        }
    }
    if tags.is_empty() {
        return (text.to_string(), Vec::new());
    }
    (words.join(" "), tags.into_iter().collect())
}
