mod error;
mod model;
pub mod builder;
pub mod svm;
pub mod utils;
pub mod vectorizer;

pub use error::ClassifierError;
pub use model::{Prediction, SentimentModel};
pub use builder::SentimentModelBuilder;
pub use svm::{LinearSvc, SvmConfig};
pub use utils::SparseVector;
pub use vectorizer::{TfidfConfig, TfidfVectorizer};

use crate::dataset::Sentiment;

/// Information about the configuration of a fitted model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Number of terms in the TF-IDF vocabulary
    pub vocabulary_size: usize,
    /// Sentiments the model can predict
    pub classes: Vec<Sentiment>,
    /// Whether stopwords are removed before vectorizing
    pub removes_stopwords: bool,
    /// Vectorizer settings used during fitting
    pub tfidf: TfidfConfig,
    pub svm: SvmConfig,
}
