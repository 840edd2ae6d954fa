//! Shell-style word splitting for chat messages.
//!
//! Words are separated by whitespace. A double-quoted run becomes part of a
//! single word with the quotes removed, so `say "hello there"` yields
//! `["say", "hello there"]`. Inside quotes a backslash escapes `"` and `\`.
//!
//! The tokenizer never fails. If a quote is left open the whole input is
//! split on whitespace instead and the result is flagged as
//! [degraded](Tokens::is_degraded).
//!
//! # Example
//!
//! ```
//! use plugbot_args::split;
//!
//! assert_eq!(split(r#"a "b c" d"#), vec!["a", "b c", "d"]);
//! assert_eq!(split(r#"a "b c"#), vec!["a", "\"b", "c"]);
//! ```

use std::ops::Deref;

const QUOTE: char = '"';
const ESCAPE: char = '\\';

/// A single word of a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The word with quotes and escapes removed.
    pub value: String,
    /// Byte offset in the original text where the word begins (including
    /// an opening quote, if the word starts with one).
    pub start: usize,
}

impl Token {
    /// Create a token.
    pub fn new(value: impl Into<String>, start: usize) -> Self {
        Self {
            value: value.into(),
            start,
        }
    }

    /// The token text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// The words of a message, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tokens {
    tokens: Vec<Token>,
    degraded: bool,
}

impl Tokens {
    /// `true` when quoting was malformed and plain whitespace splitting was
    /// used instead.
    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Iterate over the token values.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(Token::as_str)
    }

    /// Consume into the underlying vector.
    pub fn into_vec(self) -> Vec<Token> {
        self.tokens
    }
}

impl Deref for Tokens {
    type Target = [Token];

    fn deref(&self) -> &Self::Target {
        &self.tokens
    }
}

impl<'a> IntoIterator for &'a Tokens {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Split `text` into words, honouring double quotes.
pub fn tokenize(text: &str) -> Tokens {
    match split_quoted(text) {
        Some(tokens) => Tokens {
            tokens,
            degraded: false,
        },
        None => Tokens {
            tokens: split_plain(text),
            degraded: true,
        },
    }
}

/// Like [`tokenize`] but returns only the word values.
pub fn split(text: &str) -> Vec<String> {
    tokenize(text).into_vec().into_iter().map(|t| t.value).collect()
}

/// Quote-aware split. Returns `None` on an unterminated quote.
fn split_quoted(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current: Option<Token> = None;
    let mut in_quotes = false;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if in_quotes {
            // `current` is always open while inside quotes
            let word = current.get_or_insert_with(|| Token::new(String::new(), idx));
            match c {
                QUOTE => in_quotes = false,
                ESCAPE => match chars.peek() {
                    Some(&(_, next @ (QUOTE | ESCAPE))) => {
                        word.value.push(next);
                        chars.next();
                    }
                    _ => word.value.push(ESCAPE),
                },
                _ => word.value.push(c),
            }
        } else if c.is_whitespace() {
            if let Some(word) = current.take() {
                tokens.push(word);
            }
        } else {
            let word = current.get_or_insert_with(|| Token::new(String::new(), idx));
            if c == QUOTE {
                in_quotes = true;
            } else {
                word.value.push(c);
            }
        }
    }

    if in_quotes {
        return None;
    }
    if let Some(word) = current {
        tokens.push(word);
    }
    Some(tokens)
}

/// Whitespace-only split with offsets.
fn split_plain(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push(Token::new(&text[s..idx], s));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token::new(&text[s..], s));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(split("  foo   bar\tbaz "), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn quoted_words_are_single_tokens() {
        assert_eq!(split(r#"a "b c" d"#), vec!["a", "b c", "d"]);
    }

    #[test]
    fn quotes_can_open_mid_word() {
        assert_eq!(split(r#"a"b c"d e"#), vec!["ab cd", "e"]);
    }

    #[test]
    fn empty_quotes_yield_empty_token() {
        assert_eq!(split(r#"x "" y"#), vec!["x", "", "y"]);
    }

    #[test]
    fn escapes_inside_quotes() {
        assert_eq!(split(r#""say \"hi\"" "c:\\dir""#), vec![r#"say "hi""#, r"c:\dir"]);
        // other backslashes are literal
        assert_eq!(split(r#""a\nb""#), vec![r"a\nb"]);
    }

    #[test]
    fn unterminated_quote_degrades_to_plain_split() {
        let tokens = tokenize(r#"a "b c"#);
        assert!(tokens.is_degraded());
        assert_eq!(tokens.values().collect::<Vec<_>>(), vec!["a", "\"b", "c"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n ").is_empty());
    }

    #[test]
    fn offsets_point_into_original_text() {
        let text = r#"!remind  "in 5" take   the bins"#;
        let tokens = tokenize(text);
        assert_eq!(tokens[0].start, 0);
        assert_eq!(tokens[1].start, 9);
        assert_eq!(&text[tokens[1].start..tokens[1].start + 1], "\"");
        assert_eq!(&text[tokens[2].start..], "take   the bins");
    }

    #[test]
    fn degraded_offsets_match_words() {
        let text = "é \"ab  c";
        let tokens = tokenize(text);
        assert!(tokens.is_degraded());
        for t in &tokens {
            assert!(text[t.start..].starts_with(t.as_str()));
        }
    }
}
