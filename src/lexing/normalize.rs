//! Token normalization
//!
//! Post-processing applied on top of [word_spans](super::words::word_spans):
//!
//!     - lower-case each word (unless disabled)
//!     - strip exactly one trailing period
//!     - drop tokens that end up empty or are a single ASCII punctuation character
//!     - optionally re-split tokens on separator strings, discarding the separator
//!
//! The splitting variant exists because reports often glue labels to values
//! (`DF:0`, `score=1`, `foo-bar:1`), which the boundary lexer keeps as one word.
use super::words::word_spans;

/// Configurable word tokenizer producing normalized tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    lowercase: bool,
    splitters: Vec<String>,
}

impl Normalizer {
    /// Lower-casing tokenizer with no separator splitting.
    pub fn new() -> Self {
        Self {
            lowercase: true,
            splitters: Vec::new(),
        }
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Re-split tokens on each of `splitters`. Empty separators are ignored.
    pub fn with_splitters<I, S>(mut self, splitters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.splitters = splitters
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();
        self
    }

    /// Tokenize `text` into normalized tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let tokens: Vec<String> = word_spans(text)
            .into_iter()
            .filter_map(|(_, span)| normalize_word(&text[span], self.lowercase))
            .collect();

        if self.splitters.is_empty() {
            tokens
        } else {
            split_on(tokens, &self.splitters)
        }
    }

    /// Tokenize only as far as needed to produce `limit` tokens.
    ///
    /// Equivalent to `tokenize(text)` truncated to `limit`, without walking the
    /// rest of a long report.
    pub fn tokenize_window(&self, text: &str, limit: usize) -> Vec<String> {
        let mut tokens = Vec::with_capacity(limit);
        for (_, span) in word_spans(text) {
            if tokens.len() >= limit {
                break;
            }
            if let Some(token) = normalize_word(&text[span], self.lowercase) {
                tokens.extend(split_on(vec![token], &self.splitters));
            }
        }
        tokens.truncate(limit);
        tokens
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a single word, returning `None` when nothing pertinent is left.
pub fn normalize_word(word: &str, lowercase: bool) -> Option<String> {
    let folded = if lowercase {
        word.to_lowercase()
    } else {
        word.to_string()
    };
    let chomped = match folded.strip_suffix('.') {
        Some(rest) => rest.to_string(),
        None => folded,
    };
    if is_discardable(&chomped) {
        None
    } else {
        Some(chomped)
    }
}

fn is_discardable(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (None, _) => true,
        (Some(c), None) => c.is_ascii_punctuation(),
        _ => false,
    }
}

/// Split every token on each separator in turn, dropping the separator and any
/// empty pieces. A token may be split several times, on several separators.
pub fn split_on(tokens: Vec<String>, splitters: &[String]) -> Vec<String> {
    splitters.iter().fold(tokens, |tokens, separator| {
        tokens
            .into_iter()
            .flat_map(|token| {
                if token.contains(separator.as_str()) {
                    token
                        .split(separator.as_str())
                        .filter(|piece| !piece.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                } else {
                    vec![token]
                }
            })
            .collect()
    })
}

/// Positions of every token equal to `needle`.
pub fn indices_of(tokens: &[String], needle: &str) -> Vec<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| token.as_str() == needle)
        .map(|(i, _)| i)
        .collect()
}
