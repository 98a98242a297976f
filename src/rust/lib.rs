//! Sentiment classification for product reviews: a text normalizer, an
//! offline TF-IDF + linear SVM trainer, and an HTTP prediction service.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use review_sentiment::{Sentiment, SentimentModel};
//!
//! let model = SentimentModel::builder()
//!     .add_example("great tablet, love the screen", Sentiment::Positive)
//!     .add_example("awesome value, works perfectly", Sentiment::Positive)
//!     .add_example("terrible battery, returned it", Sentiment::Negative)
//!     .add_example("awful and slow, broke in a week", Sentiment::Negative)
//!     .build()?;
//!
//! let prediction = model.predict("<p>Love it, GREAT screen!</p>")?;
//! println!("Predicted: {}", prediction.sentiment);
//! # Ok(())
//! # }
//! ```
//!
//! # Training and serving
//!
//! [`trainer::train_from_csv`] reads a review CSV, fits a model and reports
//! held-out metrics. [`ModelManager`] writes the fitted model to disk and
//! [`server::serve`] exposes it over HTTP:
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use review_sentiment::{server, ModelManager, ServerConfig, TrainConfig};
//!
//! let outcome = review_sentiment::trainer::train_from_csv("reviews.csv", &TrainConfig::default())?;
//! println!("{}", outcome.report);
//!
//! let manager = ModelManager::new_default()?;
//! manager.save_model("default", &outcome.model)?;
//!
//! let model = Arc::new(manager.load_model("default")?);
//! server::serve(&ServerConfig::default(), model).await?;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod dataset;
pub mod metrics;
pub mod model_manager;
pub mod normalizer;
mod runtime;
pub mod server;
pub mod trainer;

pub use classifier::{
    ClassifierError, ModelInfo, Prediction, SentimentModel, SentimentModelBuilder, SvmConfig,
    TfidfConfig,
};
pub use dataset::{DatasetError, DatasetLoader, InvalidRowPolicy, ReviewRecord, Sentiment};
pub use metrics::{ClassificationReport, ConfusionMatrix};
pub use model_manager::{ModelError, ModelManager};
pub use normalizer::TextNormalizer;
pub use runtime::{create_runtime, RuntimeConfig};
pub use server::ServerConfig;
pub use trainer::{TrainConfig, TrainingOutcome};

/// Initializes `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
