//! Review dataset ingestion: schema, product filtering, sentiment labels and
//! the seeded train/test split.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Product the production model is trained on.
pub const DEFAULT_PRODUCT: &str = "Fire HD 7, 7\" HD Display, Wi-Fi, 8 GB";

/// Fraction of records held out for evaluation.
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

pub const DEFAULT_SEED: u64 = 42;

const PRODUCT_TITLE: &str = "product_title";
const REVIEW_BODY: &str = "review_body";
const STAR_RATING: &str = "star_rating";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Dataset is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("Invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
    #[error("No records matched product filter {0:?}")]
    EmptySelection(Option<String>),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
}

/// Binary sentiment derived from a star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sentiment {
    Negative = 0,
    Positive = 1,
}

impl Sentiment {
    /// Four and five stars are positive, everything else is negative.
    pub fn from_star_rating(star_rating: f32) -> Self {
        if star_rating == 5.0 || star_rating == 4.0 {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }

    /// Class id used by the classifier.
    pub fn class_id(self) -> usize {
        self as usize
    }

    pub fn from_class_id(id: usize) -> Option<Self> {
        match id {
            0 => Some(Sentiment::Negative),
            1 => Some(Sentiment::Positive),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Positive => "Positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One product review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub product_title: String,
    pub review_body: String,
    pub star_rating: f32,
}

impl ReviewRecord {
    pub fn new(product_title: impl Into<String>, review_body: impl Into<String>, star_rating: f32) -> Self {
        Self {
            product_title: product_title.into(),
            review_body: review_body.into(),
            star_rating,
        }
    }

    pub fn sentiment(&self) -> Sentiment {
        Sentiment::from_star_rating(self.star_rating)
    }
}

/// What to do with rows that do not satisfy the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidRowPolicy {
    /// Fail the whole load
    #[default]
    Reject,
    /// Drop the row and keep going
    Skip,
}

/// Records that survived loading, plus how many rows were dropped.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<ReviewRecord>,
    pub skipped: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct product titles and how many reviews each has.
    pub fn product_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.product_title.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Keeps only reviews of `product`.
    pub fn filter_product(self, product: &str) -> Result<Self, DatasetError> {
        let records: Vec<_> = self
            .records
            .into_iter()
            .filter(|r| r.product_title == product)
            .collect();
        if records.is_empty() {
            return Err(DatasetError::EmptySelection(Some(product.to_string())));
        }
        Ok(Self {
            records,
            skipped: self.skipped,
        })
    }
}

/// Reads review CSV files with a header row.
#[derive(Debug, Clone, Default)]
pub struct DatasetLoader {
    policy: InvalidRowPolicy,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invalid_rows(mut self, policy: InvalidRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Dataset, DatasetError> {
        let path = path.as_ref();
        info!("Loading review dataset from {:?}", path);
        let file = File::open(path)?;
        self.load_reader(file)
    }

    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Dataset, DatasetError> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let columns = Columns::locate(&headers)?;

        let mut dataset = Dataset::default();
        for row in csv.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            match columns.parse(&row) {
                Ok(record) => dataset.records.push(record),
                Err(reason) => match self.policy {
                    InvalidRowPolicy::Reject => {
                        return Err(DatasetError::InvalidRow { line, reason });
                    }
                    InvalidRowPolicy::Skip => {
                        warn!("Skipping line {}: {}", line, reason);
                        dataset.skipped += 1;
                    }
                },
            }
        }

        info!("Loaded {} reviews ({} skipped)", dataset.records.len(), dataset.skipped);
        Ok(dataset)
    }
}

struct Columns {
    product_title: usize,
    review_body: usize,
    star_rating: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(DatasetError::MissingColumn(name))
        };
        Ok(Self {
            product_title: find(PRODUCT_TITLE)?,
            review_body: find(REVIEW_BODY)?,
            star_rating: find(STAR_RATING)?,
        })
    }

    fn parse(&self, row: &StringRecord) -> Result<ReviewRecord, String> {
        let product_title = row.get(self.product_title).unwrap_or_default();

        let review_body = row.get(self.review_body).unwrap_or_default();
        if review_body.trim().is_empty() {
            return Err(format!("`{}` is empty", REVIEW_BODY));
        }

        let raw_rating = row.get(self.star_rating).unwrap_or_default().trim();
        let star_rating = raw_rating
            .parse::<f32>()
            .ok()
            .filter(|r| r.is_finite())
            .ok_or_else(|| format!("`{}` is not a number: {:?}", STAR_RATING, raw_rating))?;

        Ok(ReviewRecord::new(product_title, review_body, star_rating))
    }
}

/// Train and test partitions.
#[derive(Debug, Clone)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Shuffles `items` with a seeded RNG and holds out `ceil(test_size * n)` of
/// them for testing.
pub fn train_test_split<T: Clone>(items: &[T], test_size: f64, seed: u64) -> Result<Split<T>, DatasetError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DatasetError::InvalidSplit(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n = items.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DatasetError::InvalidSplit(format!(
            "{} samples with test_size {} leaves an empty partition",
            n, test_size
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let test = order[..n_test].iter().map(|&i| items[i].clone()).collect();
    let train = order[n_test..].iter().map(|&i| items[i].clone()).collect();
    Ok(Split { train, test })
}
