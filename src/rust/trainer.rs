//! Offline training: dataset in, fitted [`SentimentModel`] and evaluation
//! report out.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

use crate::classifier::{SentimentModel, SentimentModelBuilder, SvmConfig, TfidfConfig};
use crate::dataset::{
    self, DatasetLoader, InvalidRowPolicy, ReviewRecord, Sentiment, DEFAULT_PRODUCT, DEFAULT_SEED,
    DEFAULT_TEST_SIZE,
};
use crate::metrics::ClassificationReport;
use crate::normalizer::TextNormalizer;

/// Everything that controls one training run.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Only reviews of this product are used; `None` trains on every product
    pub product: Option<String>,
    pub test_size: f64,
    /// Seed for the train/test split
    pub seed: u64,
    pub invalid_rows: InvalidRowPolicy,
    pub normalizer: TextNormalizer,
    pub tfidf: TfidfConfig,
    pub svm: SvmConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            product: Some(DEFAULT_PRODUCT.to_string()),
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            invalid_rows: InvalidRowPolicy::Reject,
            normalizer: TextNormalizer::default(),
            tfidf: TfidfConfig::default(),
            svm: SvmConfig::default(),
        }
    }
}

/// Result of a training run.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub model: SentimentModel,
    pub report: ClassificationReport,
    pub train_len: usize,
    pub test_len: usize,
}

/// Reads the CSV at `dataset_path` and trains on it.
pub fn train_from_csv(dataset_path: impl Into<PathBuf>, config: &TrainConfig) -> Result<TrainingOutcome> {
    let dataset_path = dataset_path.into();
    if !dataset_path.exists() {
        anyhow::bail!("dataset path {:?} does not exist", dataset_path);
    }

    let mut dataset = DatasetLoader::new()
        .with_invalid_rows(config.invalid_rows)
        .load_path(&dataset_path)
        .with_context(|| format!("failed to load dataset {:?}", dataset_path))?;

    if let Some(product) = &config.product {
        dataset = dataset.filter_product(product)?;
        info!("Selected {} reviews of {:?}", dataset.len(), product);
    }

    train(&dataset.records, config)
}

/// Splits `records`, fits the model on the training part and evaluates it
/// on the held-out part. Records are used as given; product filtering
/// happens in [`train_from_csv`].
pub fn train(records: &[ReviewRecord], config: &TrainConfig) -> Result<TrainingOutcome> {
    let start = Instant::now();
    if records.is_empty() {
        anyhow::bail!("no reviews to train on");
    }

    let positives = records.iter().filter(|r| r.sentiment() == Sentiment::Positive).count();
    info!(
        "Training on {} reviews ({} positive, {} negative)",
        records.len(),
        positives,
        records.len() - positives
    );

    let split = dataset::train_test_split(records, config.test_size, config.seed)?;
    info!("Split into {} training and {} test reviews", split.train.len(), split.test.len());

    let model = SentimentModelBuilder::new()
        .with_normalizer(config.normalizer)
        .with_tfidf_config(config.tfidf.clone())
        .with_svm_config(config.svm.clone())
        .add_examples(split.train.iter().map(|r| (r.review_body.as_str(), r.sentiment())))
        .build()
        .context("failed to fit sentiment model")?;

    let y_true: Vec<usize> = split.test.iter().map(|r| r.sentiment().class_id()).collect();
    let y_pred: Vec<usize> = split
        .test
        .iter()
        .map(|r| model.predict(&r.review_body).map(|p| p.sentiment.class_id()))
        .collect::<Result<_, _>>()?;

    let report = ClassificationReport::compute(&y_true, &y_pred, |id| {
        Sentiment::from_class_id(id).map(|s| s.label().to_string())
    })?;

    info!("accuracy: {:.4}", report.accuracy);
    info!("precision: {:.4}", report.weighted_avg.precision);
    info!("recall: {:.4}", report.weighted_avg.recall);
    info!("f1: {:.4}", report.weighted_avg.f1);
    info!("Training finished in {:.2?}", start.elapsed());

    Ok(TrainingOutcome {
        model,
        report,
        train_len: split.train.len(),
        test_len: split.test.len(),
    })
}
