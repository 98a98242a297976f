use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::svm::LinearSvc;
use super::vectorizer::TfidfVectorizer;
use crate::dataset::Sentiment;
use crate::normalizer::TextNormalizer;

/// A fitted sentiment model: the normalizer settings, the TF-IDF vectorizer
/// and the linear SVM, frozen together.
///
/// # Thread Safety
///
/// The model is immutable after construction and all of its fields are plain
/// owned data, so it is `Send + Sync` and can be shared behind an `Arc`:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use review_sentiment::{SentimentModel, Sentiment};
/// use std::sync::Arc;
/// use std::thread;
///
/// let model = Arc::new(SentimentModel::builder()
///     .add_example("love it, great tablet", Sentiment::Positive)
///     .add_example("terrible, it broke", Sentiment::Negative)
///     .build()?);
///
/// let shared = Arc::clone(&model);
/// let handle = thread::spawn(move || shared.predict("great").map(|p| p.sentiment));
/// assert_eq!(handle.join().unwrap()?, Sentiment::Positive);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentModel {
    pub(crate) normalizer: TextNormalizer,
    pub(crate) vectorizer: TfidfVectorizer,
    pub(crate) svm: LinearSvc,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<SentimentModel>();
    }
};

/// Outcome of classifying one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub sentiment: Sentiment,
    /// Signed distance to the decision boundary; positive means `Positive`
    pub score: f32,
}

impl SentimentModel {
    /// Creates a new SentimentModelBuilder for fluent construction
    pub fn builder() -> super::builder::SentimentModelBuilder {
        super::builder::SentimentModelBuilder::new()
    }

    /// Assembles a model from already fitted parts, checking they fit together.
    pub fn from_parts(
        normalizer: TextNormalizer,
        vectorizer: TfidfVectorizer,
        svm: LinearSvc,
    ) -> Result<Self, ClassifierError> {
        let model = Self {
            normalizer,
            vectorizer,
            svm,
        };
        model.validate()?;
        Ok(model)
    }

    /// Returns information about the model's configuration
    pub fn info(&self) -> super::ModelInfo {
        super::ModelInfo {
            vocabulary_size: self.vectorizer.dim(),
            classes: self
                .svm
                .classes()
                .iter()
                .filter_map(|&id| Sentiment::from_class_id(id))
                .collect(),
            removes_stopwords: self.normalizer.remove_stopwords,
            tfidf: self.vectorizer.config().clone(),
            svm: self.svm.config().clone(),
        }
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn svm(&self) -> &LinearSvc {
        &self.svm
    }

    /// Normalizes, vectorizes and classifies a raw text.
    ///
    /// Text that normalizes to nothing is still classified, from the
    /// intercept alone.
    pub fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let cleaned = self.normalizer.normalize(text);
        self.predict_normalized(&cleaned)
    }

    /// Classifies text that has already been through [`TextNormalizer`].
    pub fn predict_normalized(&self, cleaned: &str) -> Result<Prediction, ClassifierError> {
        let features = self.vectorizer.transform(cleaned);
        let (class, score) = self.svm.predict(&features)?;
        let sentiment = Sentiment::from_class_id(class).ok_or_else(|| {
            ClassifierError::PredictionError(format!("Model produced unknown class {}", class))
        })?;
        Ok(Prediction { sentiment, score })
    }

    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Prediction>, ClassifierError> {
        texts.iter().map(|t| self.predict(t.as_ref())).collect()
    }

    /// Checks a model is internally consistent; run on every loaded artifact.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        self.vectorizer.validate()?;
        self.svm.validate()?;
        if self.svm.dim() != self.vectorizer.dim() {
            return Err(ClassifierError::ValidationError(format!(
                "Classifier expects {} features but the vocabulary has {}",
                self.svm.dim(),
                self.vectorizer.dim()
            )));
        }
        if let Some(&unknown) = self
            .svm
            .classes()
            .iter()
            .find(|&&id| Sentiment::from_class_id(id).is_none())
        {
            return Err(ClassifierError::ValidationError(format!(
                "Class {} is not a sentiment",
                unknown
            )));
        }
        Ok(())
    }
}
