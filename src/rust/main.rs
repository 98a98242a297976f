use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use review_sentiment::dataset::{DEFAULT_PRODUCT, DEFAULT_SEED, DEFAULT_TEST_SIZE};
use review_sentiment::{
    create_runtime, server, DatasetLoader, InvalidRowPolicy, ModelManager, RuntimeConfig,
    SentimentModel, ServerConfig, SvmConfig, TextNormalizer, TrainConfig,
};

const DEFAULT_MODEL_NAME: &str = "default";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model from a review CSV and save it
    Train(TrainArgs),
    /// Serve a saved model over HTTP
    Serve(ServeArgs),
    /// Classify texts from the command line
    Predict(PredictArgs),
    /// List the products in a review CSV
    Products {
        /// Review CSV with product_title, review_body and star_rating columns
        #[arg(long)]
        dataset: PathBuf,
    },
}

/// Where a model is read from or written to.
#[derive(Args)]
struct ModelLocation {
    /// Name of the model in the models directory
    #[arg(long, default_value = DEFAULT_MODEL_NAME)]
    model_name: String,
    /// Explicit model file, overrides --model-name
    #[arg(long = "model", alias = "output", value_name = "PATH")]
    model_path: Option<PathBuf>,
}

impl ModelLocation {
    fn load(&self) -> Result<SentimentModel> {
        let model = match &self.model_path {
            Some(path) => ModelManager::load_from_path(path)
                .with_context(|| format!("failed to load model from {:?}", path))?,
            None => {
                let manager = ModelManager::new_default()?;
                manager.load_model(&self.model_name).with_context(|| {
                    format!(
                        "failed to load model {:?} from {:?} (run `train` first)",
                        self.model_name,
                        manager.models_dir()
                    )
                })?
            }
        };
        let info = model.info();
        info!(
            "Loaded model: {} terms, classes {:?}, stopword removal {}",
            info.vocabulary_size, info.classes, info.removes_stopwords
        );
        Ok(model)
    }

    fn save(&self, model: &SentimentModel) -> Result<()> {
        match &self.model_path {
            Some(path) => {
                let hash = ModelManager::save_to_path(path, model)?;
                info!("Model written to {:?} (sha256 {})", path, hash);
            }
            None => {
                let manager = ModelManager::new_default()?;
                let hash = manager.save_model(&self.model_name, model)?;
                info!(
                    "Model {:?} written to {:?} (sha256 {})",
                    self.model_name,
                    manager.get_model_path(&self.model_name),
                    hash
                );
            }
        }
        Ok(())
    }
}

#[derive(Args)]
struct TrainArgs {
    /// Review CSV with product_title, review_body and star_rating columns
    #[arg(long)]
    dataset: PathBuf,
    /// Only train on reviews of this product
    #[arg(long, default_value = DEFAULT_PRODUCT, conflicts_with = "all_products")]
    product: String,
    /// Train on every product in the dataset
    #[arg(long)]
    all_products: bool,
    /// Fraction of reviews held out for evaluation
    #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
    test_size: f64,
    /// Seed for the train/test split and the solver
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Inverse regularization strength
    #[arg(long, default_value_t = 1.0)]
    c: f32,
    #[arg(long, default_value_t = 1000)]
    max_iter: usize,
    /// Drop English stopwords before vectorizing
    #[arg(long)]
    remove_stopwords: bool,
    /// Skip rows with a missing body or unparsable rating instead of failing
    #[arg(long)]
    skip_invalid_rows: bool,
    #[command(flatten)]
    location: ModelLocation,
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "REVIEW_SENTIMENT_HOST", default_value = "127.0.0.1")]
    host: String,
    #[arg(long, env = "REVIEW_SENTIMENT_PORT", default_value_t = 5000)]
    port: u16,
    /// Number of runtime worker threads (0 lets tokio decide)
    #[arg(long, default_value_t = 0)]
    workers: usize,
    /// Do not send CORS headers
    #[arg(long)]
    no_cors: bool,
    #[command(flatten)]
    location: ModelLocation,
}

#[derive(Args)]
struct PredictArgs {
    #[command(flatten)]
    location: ModelLocation,
    /// Texts to classify
    #[arg(required = true)]
    texts: Vec<String>,
}

fn main() -> Result<()> {
    review_sentiment::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Command::Train(args) => train(args),
        Command::Serve(args) => serve(args),
        Command::Predict(args) => predict(args),
        Command::Products { dataset } => products(dataset),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let start = Instant::now();
    info!("=== Training sentiment model ===");

    let config = TrainConfig {
        product: (!args.all_products).then(|| args.product.clone()),
        test_size: args.test_size,
        seed: args.seed,
        invalid_rows: if args.skip_invalid_rows {
            InvalidRowPolicy::Skip
        } else {
            InvalidRowPolicy::Reject
        },
        normalizer: TextNormalizer::new().with_stopword_removal(args.remove_stopwords),
        svm: SvmConfig {
            c: args.c,
            max_iter: args.max_iter,
            seed: args.seed,
            ..SvmConfig::default()
        },
        ..TrainConfig::default()
    };

    let outcome = review_sentiment::trainer::train_from_csv(&args.dataset, &config)?;
    println!("{}", outcome.report);

    args.location.save(&outcome.model)?;
    info!("=== Training complete (took {:.2?}) ===", start.elapsed());
    Ok(())
}

fn serve(args: ServeArgs) -> Result<()> {
    let model = Arc::new(args.location.load()?);
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        cors: !args.no_cors,
    };
    let runtime = create_runtime(&RuntimeConfig {
        worker_threads: args.workers,
        ..RuntimeConfig::default()
    })
    .context("failed to start tokio runtime")?;

    runtime.block_on(server::serve(&config, model))
}

fn predict(args: PredictArgs) -> Result<()> {
    let model = args.location.load()?;
    for text in &args.texts {
        let prediction = model.predict(text)?;
        println!("{}\t{:+.4}\t{}", prediction.sentiment, prediction.score, text);
    }
    Ok(())
}

fn products(dataset: PathBuf) -> Result<()> {
    let dataset = DatasetLoader::new()
        .with_invalid_rows(InvalidRowPolicy::Skip)
        .load_path(&dataset)
        .with_context(|| format!("failed to load dataset {:?}", dataset))?;

    let mut counts: Vec<_> = dataset.product_counts().into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (product, count) in counts {
        println!("{:>7}  {}", count, product);
    }
    Ok(())
}
