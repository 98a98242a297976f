//! Review text normalization shared by training and serving.
//!
//! A review body goes through three steps, in order:
//!
//! 1. [`remove_html`] drops tags and comments and decodes character entities
//! 2. [`remove_special_chars`] replaces everything outside `[a-zA-Z]` with a space
//! 3. [`to_lower_case`] lowercases and collapses whitespace
//!
//! [`remove_stopwords`] is available as a fourth step but is off by default,
//! see [`TextNormalizer`].
//!
//! ```
//! use review_sentiment::normalizer::normalize;
//!
//! assert_eq!(normalize("Great <b>tablet</b>, 5 stars!!"), "great tablet stars");
//! ```

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref MARKUP: Regex =
        Regex::new(r"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|</?[a-zA-Z][^>]*>").expect("markup pattern");
    static ref ENTITY: Regex =
        Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z][a-zA-Z0-9]{1,31});").expect("entity pattern");
    static ref NON_ALPHA: Regex = Regex::new(r"[^a-zA-Z]").expect("non-alpha pattern");

    /// NLTK's English stopword list.
    pub static ref ENGLISH_STOPWORDS: HashSet<&'static str> = [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
        "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he",
        "him", "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's",
        "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "that'll", "these", "those", "am", "is", "are",
        "was", "were", "be", "been", "being", "have", "has", "had", "having", "do",
        "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because",
        "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
        "between", "into", "through", "during", "before", "after", "above", "below",
        "to", "from", "up", "down", "in", "out", "on", "off", "over", "under", "again",
        "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
        "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t",
        "can", "will", "just", "don", "don't", "should", "should've", "now", "d", "ll",
        "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't",
        "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't",
        "haven", "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn",
        "mustn't", "needn", "needn't", "shan", "shan't", "shouldn", "shouldn't",
        "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
    ]
    .into_iter()
    .collect();
}

/// Configurable normalization pipeline.
///
/// The default leaves stopwords in place. That matches how every model in
/// production so far was trained; turning `remove_stopwords` on changes the
/// features a model sees, so the setting travels with the model bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNormalizer {
    /// Drop English stopwords after lowercasing
    #[serde(default)]
    pub remove_stopwords: bool,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stopword_removal(mut self, enabled: bool) -> Self {
        self.remove_stopwords = enabled;
        self
    }

    /// Runs the full pipeline over `raw`.
    pub fn normalize(&self, raw: &str) -> String {
        let text = remove_html(raw);
        let text = remove_special_chars(&text);
        let text = to_lower_case(&text);
        if self.remove_stopwords {
            remove_stopwords(&text)
        } else {
            text
        }
    }
}

/// Normalizes with the default pipeline.
pub fn normalize(raw: &str) -> String {
    TextNormalizer::default().normalize(raw)
}

/// Strips markup and decodes entities, keeping only text content.
///
/// Tags are removed without inserting a separator, so `a<br/>b` becomes
/// `ab`. A `<` that does not open a tag is kept as text.
pub fn remove_html(raw: &str) -> String {
    let stripped = MARKUP.replace_all(raw, "");
    ENTITY
        .replace_all(&stripped, |caps: &Captures| decode_entity(&caps[1], &caps[0]))
        .into_owned()
}

fn decode_entity(name: &str, original: &str) -> String {
    let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        named_entity(name)
    };

    match decoded {
        Some(c) => c.to_string(),
        None => original.to_string(),
    }
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "hellip" => '\u{2026}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        _ => return None,
    };
    Some(c)
}

/// Replaces every character outside `[a-zA-Z]` with a single space.
pub fn remove_special_chars(raw: &str) -> String {
    NON_ALPHA.replace_all(raw, " ").into_owned()
}

/// Lowercases and joins whitespace-separated tokens with single spaces.
pub fn to_lower_case(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drops English stopwords from a whitespace-tokenized string.
pub fn remove_stopwords(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !ENGLISH_STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}
