use log::info;

use super::error::ClassifierError;
use super::model::SentimentModel;
use super::svm::{LinearSvc, SvmConfig};
use super::vectorizer::{TfidfConfig, TfidfVectorizer};
use crate::dataset::Sentiment;
use crate::normalizer::TextNormalizer;

/// A builder for training a SentimentModel with a fluent interface.
///
/// Examples are raw review texts; they are normalized with the configured
/// [`TextNormalizer`] before the vectorizer is fitted, and the same
/// normalizer is stored in the resulting model so predictions see identical
/// preprocessing.
#[derive(Default, Debug, Clone)]
pub struct SentimentModelBuilder {
    normalizer: TextNormalizer,
    tfidf_config: TfidfConfig,
    svm_config: SvmConfig,
    texts: Vec<String>,
    labels: Vec<Sentiment>,
}

impl SentimentModelBuilder {
    /// Creates a new empty SentimentModelBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use review_sentiment::SentimentModelBuilder;
    ///
    /// let builder = SentimentModelBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text normalization pipeline
    ///
    /// # Example
    /// ```
    /// use review_sentiment::{SentimentModelBuilder, TextNormalizer};
    ///
    /// let builder = SentimentModelBuilder::new()
    ///     .with_normalizer(TextNormalizer::new().with_stopword_removal(true));
    /// ```
    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Sets the TF-IDF vectorizer configuration
    pub fn with_tfidf_config(mut self, config: TfidfConfig) -> Self {
        self.tfidf_config = config;
        self
    }

    /// Sets the linear SVM hyper-parameters
    ///
    /// # Example
    /// ```
    /// use review_sentiment::{SentimentModelBuilder, SvmConfig};
    ///
    /// let builder = SentimentModelBuilder::new()
    ///     .with_svm_config(SvmConfig { c: 0.5, ..SvmConfig::default() });
    /// ```
    pub fn with_svm_config(mut self, config: SvmConfig) -> Self {
        self.svm_config = config;
        self
    }

    /// Adds one labeled training text
    pub fn add_example(mut self, text: impl Into<String>, sentiment: Sentiment) -> Self {
        self.texts.push(text.into());
        self.labels.push(sentiment);
        self
    }

    /// Adds many labeled training texts
    ///
    /// # Example
    /// ```
    /// use review_sentiment::{SentimentModelBuilder, Sentiment};
    ///
    /// let builder = SentimentModelBuilder::new().add_examples(vec![
    ///     ("works great", Sentiment::Positive),
    ///     ("stopped charging", Sentiment::Negative),
    /// ]);
    /// ```
    pub fn add_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = (S, Sentiment)>,
        S: Into<String>,
    {
        for (text, sentiment) in examples {
            self.texts.push(text.into());
            self.labels.push(sentiment);
        }
        self
    }

    /// Number of examples added so far
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Fits the vectorizer and classifier and returns the frozen model
    ///
    /// # Returns
    /// * `Result<SentimentModel, ClassifierError>` - The trained model, or an error if:
    ///   - No examples have been added
    ///   - Only one sentiment is represented
    ///   - The normalized texts contain no usable tokens
    ///
    /// # Example
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use review_sentiment::{SentimentModel, Sentiment};
    ///
    /// let model = SentimentModel::builder()
    ///     .add_example("fast and bright screen", Sentiment::Positive)
    ///     .add_example("slow and dim screen", Sentiment::Negative)
    ///     .build()?;
    /// assert_eq!(model.predict("bright")?.sentiment, Sentiment::Positive);
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<SentimentModel, ClassifierError> {
        if self.texts.is_empty() {
            return Err(ClassifierError::BuildError("At least one example must be added".into()));
        }
        if !self.labels.contains(&Sentiment::Positive) || !self.labels.contains(&Sentiment::Negative) {
            return Err(ClassifierError::BuildError(
                "Examples of both positive and negative sentiment are required".into(),
            ));
        }

        info!("Normalizing {} training texts", self.texts.len());
        let cleaned: Vec<String> = self
            .texts
            .iter()
            .map(|text| self.normalizer.normalize(text))
            .collect();

        let vectorizer = TfidfVectorizer::fit(self.tfidf_config, &cleaned)?;
        let features = vectorizer.transform_batch(&cleaned);
        let labels: Vec<usize> = self.labels.iter().map(|s| s.class_id()).collect();

        info!(
            "Fitting linear SVM on {} samples x {} features (C = {})",
            features.len(),
            vectorizer.dim(),
            self.svm_config.c
        );
        let svm = LinearSvc::fit(&self.svm_config, &features, &labels)?;

        SentimentModel::from_parts(self.normalizer, vectorizer, svm)
    }
}
