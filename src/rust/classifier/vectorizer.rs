use std::collections::{BTreeMap, HashMap, HashSet};

use log::info;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::SparseVector;

/// Settings for [`TfidfVectorizer`]. The defaults follow scikit-learn's
/// `TfidfVectorizer(use_idf=True, strip_accents='ascii')`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfConfig {
    pub lowercase: bool,
    /// Fold accented Latin letters to ASCII and drop other non-ASCII characters
    pub strip_accents: bool,
    /// Tokens shorter than this are ignored
    pub min_token_len: usize,
    pub use_idf: bool,
    /// Add one to document frequencies as if an extra document contained every term
    pub smooth_idf: bool,
    /// Replace `tf` with `1 + ln(tf)`
    pub sublinear_tf: bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_accents: true,
            min_token_len: 2,
            use_idf: true,
            smooth_idf: true,
            sublinear_tf: false,
        }
    }
}

/// A fitted TF-IDF vectorizer.
///
/// The vocabulary is sorted, so column `i` is the `i`-th term in
/// lexicographic order. Rows produced by [`transform`](Self::transform) are
/// L2-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: TfidfConfig,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Learns vocabulary and IDF weights from `documents`.
    pub fn fit<S: AsRef<str>>(config: TfidfConfig, documents: &[S]) -> Result<Self, ClassifierError> {
        if documents.is_empty() {
            return Err(ClassifierError::VectorizerError(
                "Cannot fit a vectorizer on zero documents".into(),
            ));
        }

        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: HashSet<String> = tokenize(&config, doc.as_ref()).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(ClassifierError::VectorizerError(
                "Empty vocabulary; the documents contain no usable tokens".into(),
            ));
        }

        let n = documents.len() as f32;
        let mut vocabulary = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (column, (term, df)) in doc_freq.into_iter().enumerate() {
            idf.push(idf_weight(&config, n, df as f32));
            vocabulary.insert(term, column);
        }

        info!("Fitted TF-IDF vocabulary of {} terms over {} documents", vocabulary.len(), documents.len());
        Ok(Self {
            config,
            vocabulary,
            idf,
        })
    }

    pub fn config(&self) -> &TfidfConfig {
        &self.config
    }

    /// Number of feature columns.
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    /// Projects one document into feature space. Terms outside the
    /// vocabulary are ignored, so a document with no known terms maps to
    /// the zero vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokenize(&self.config, document) {
            if let Some(&column) = self.vocabulary.get(&token) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(column, tf)| {
                let tf = if self.config.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (column, tf * self.idf[column])
            })
            .collect();

        let mut row = SparseVector::from_pairs(self.dim(), pairs);
        row.normalize();
        row
    }

    pub fn transform_batch<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents.iter().map(|d| self.transform(d.as_ref())).collect()
    }

    /// Checks the internal tables agree with each other. Used after
    /// deserializing a persisted model.
    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Vocabulary has {} terms but {} IDF weights",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }
        if self.vocabulary.values().any(|&column| column >= self.idf.len()) {
            return Err(ClassifierError::ValidationError(
                "Vocabulary column out of range".into(),
            ));
        }
        Ok(())
    }
}

fn idf_weight(config: &TfidfConfig, n: f32, df: f32) -> f32 {
    if !config.use_idf {
        1.0
    } else if config.smooth_idf {
        ((1.0 + n) / (1.0 + df)).ln() + 1.0
    } else {
        (n / df).ln() + 1.0
    }
}

/// Splits `text` into runs of word characters at least `min_token_len` long.
pub(crate) fn tokenize(config: &TfidfConfig, text: &str) -> Vec<String> {
    let mut prepared = if config.lowercase {
        text.to_lowercase()
    } else {
        text.to_string()
    };
    if config.strip_accents {
        prepared = prepared.chars().filter_map(fold_to_ascii).collect();
    }

    prepared
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= config.min_token_len.max(1))
        .map(str::to_string)
        .collect()
}

fn fold_to_ascii(c: char) -> Option<char> {
    if c.is_ascii() {
        return Some(c);
    }
    let folded = match c {
        'À'..='Å' => 'A',
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'Ç' | 'Ć' | 'Č' => 'C',
        'ç' | 'ć' | 'č' => 'c',
        'È'..='Ë' | 'Ē' | 'Ę' | 'Ě' => 'E',
        'è'..='ë' | 'ē' | 'ę' | 'ě' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' | 'ī' => 'i',
        'Ñ' | 'Ń' | 'Ň' => 'N',
        'ñ' | 'ń' | 'ň' => 'n',
        'Ò'..='Ö' | 'Ō' => 'O',
        'ò'..='ö' | 'ō' => 'o',
        'Ù'..='Ü' | 'Ū' | 'Ů' => 'U',
        'ù'..='ü' | 'ū' | 'ů' => 'u',
        'Ý' | 'Ÿ' => 'Y',
        'ý' | 'ÿ' => 'y',
        'Ś' | 'Š' => 'S',
        'ś' | 'š' => 's',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        'ź' | 'ż' | 'ž' => 'z',
        'Ř' => 'R',
        'ř' => 'r',
        'Ť' => 'T',
        'ť' => 't',
        'Ď' => 'D',
        'ď' => 'd',
        _ => return None,
    };
    Some(folded)
}
