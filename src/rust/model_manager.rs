use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log;
use sha2::{Digest, Sha256};

use crate::classifier::SentimentModel;

const MODEL_FILE: &str = "model.json";
const CHECKSUM_FILE: &str = "model.sha256";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: String,
        expected: String,
        actual: String,
    },
    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

/// Persists fitted models as JSON with a SHA-256 checksum next to them.
///
/// Named models live at `<models_dir>/<name>/model.json`.
#[derive(Debug, Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("REVIEW_SENTIMENT_HOME") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("review-sentiment").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("review-sentiment").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("review-sentiment").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self { models_dir })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join(MODEL_FILE)
    }

    pub fn get_checksum_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join(CHECKSUM_FILE)
    }

    pub fn is_model_saved(&self, name: &str) -> bool {
        let model_path = self.get_model_path(name);
        let checksum_path = self.get_checksum_path(name);
        log::info!("Checking if model is saved:");
        log::info!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::info!("  Checksum path: {:?} (exists: {})", checksum_path, checksum_path.exists());
        model_path.exists() && checksum_path.exists()
    }

    /// Writes `model` under `name`, replacing any previous version, and
    /// returns the checksum of the written file.
    pub fn save_model(&self, name: &str, model: &SentimentModel) -> Result<String, ModelError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ModelError::InvalidModel(format!("Invalid model name {:?}", name)));
        }
        let model_dir = self.models_dir.join(name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;
        write_model(&self.get_model_path(name), &self.get_checksum_path(name), model)
    }

    /// Loads the model saved under `name`, verifying its checksum.
    pub fn load_model(&self, name: &str) -> Result<SentimentModel, ModelError> {
        if !self.is_model_saved(name) {
            return Err(ModelError::NotFound(name.to_string()));
        }
        read_model(&self.get_model_path(name), Some(&self.get_checksum_path(name)))
    }

    pub fn verify_model(&self, name: &str) -> Result<bool, ModelError> {
        let model_path = self.get_model_path(name);
        let checksum_path = self.get_checksum_path(name);

        log::info!("Verifying model files:");
        log::info!("  Model path: {:?}", model_path);
        log::info!("  Checksum path: {:?}", checksum_path);

        if !model_path.exists() || !checksum_path.exists() {
            log::info!("One or both files do not exist");
            return Ok(false);
        }

        let expected = fs::read_to_string(&checksum_path)?;
        let ok = verify_file(&model_path, expected.trim())?;
        log::info!("  Model hash verification: {}", ok);
        Ok(ok)
    }

    pub fn remove_model(&self, name: &str) -> Result<(), ModelError> {
        let model_path = self.get_model_path(name);
        let checksum_path = self.get_checksum_path(name);

        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        if checksum_path.exists() {
            fs::remove_file(&checksum_path)?;
        }
        Ok(())
    }

    /// Writes a model to an explicit file with a `<file>.sha256` sidecar.
    pub fn save_to_path<P: AsRef<Path>>(path: P, model: &SentimentModel) -> Result<String, ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            log::info!("Creating parent directory: {:?}", parent);
            fs::create_dir_all(parent)?;
        }
        write_model(path, &sidecar_path(path), model)
    }

    /// Reads a model from an explicit file; the sidecar checksum is verified
    /// when present.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<SentimentModel, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::NotFound(path.display().to_string()));
        }
        let sidecar = sidecar_path(path);
        if sidecar.exists() {
            read_model(path, Some(&sidecar))
        } else {
            log::warn!("No checksum found next to {:?}, loading unverified", path);
            read_model(path, None)
        }
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn verify_file(path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
    log::info!("Verifying file: {:?}", path);
    let bytes = fs::read(path)?;
    let hash = hash_bytes(&bytes);
    log::info!("Calculated hash: {}", hash);
    log::info!("Expected hash:   {}", expected_hash);
    Ok(hash == expected_hash)
}

fn write_model(model_path: &Path, checksum_path: &Path, model: &SentimentModel) -> Result<String, ModelError> {
    let bytes = serde_json::to_vec(model)?;
    let hash = hash_bytes(&bytes);

    log::info!("Writing {} bytes to {:?}", bytes.len(), model_path);
    fs::write(model_path, &bytes)?;
    fs::write(checksum_path, format!("{}\n", hash))?;

    if !verify_file(model_path, &hash)? {
        return Err(ModelError::HashMismatch {
            path: model_path.display().to_string(),
            expected: hash.clone(),
            actual: hash_bytes(&fs::read(model_path)?),
        });
    }
    log::info!("Model saved and verified ({})", hash);
    Ok(hash)
}

fn read_model(model_path: &Path, checksum_path: Option<&Path>) -> Result<SentimentModel, ModelError> {
    let bytes = fs::read(model_path)?;
    log::info!("Read {} bytes from {:?}", bytes.len(), model_path);

    if let Some(checksum_path) = checksum_path {
        let expected = fs::read_to_string(checksum_path)?.trim().to_string();
        let actual = hash_bytes(&bytes);
        if actual != expected {
            log::error!("Model hash mismatch: expected {}, got {}", expected, actual);
            return Err(ModelError::HashMismatch {
                path: model_path.display().to_string(),
                expected,
                actual,
            });
        }
    }

    let model: SentimentModel = serde_json::from_slice(&bytes)?;
    model
        .validate()
        .map_err(|e| ModelError::InvalidModel(e.to_string()))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Sentiment;

    fn tiny_model() -> SentimentModel {
        SentimentModel::builder()
            .add_example("good", Sentiment::Positive)
            .add_example("bad", Sentiment::Negative)
            .build()
            .expect("model should build")
    }

    #[test]
    fn test_default_models_dir() {
        // Test with environment variable
        env::set_var("REVIEW_SENTIMENT_HOME", "/tmp/review-sentiment-test");
        let path = ModelManager::get_default_models_dir();
        assert_eq!(path, PathBuf::from("/tmp/review-sentiment-test/models"));
        env::remove_var("REVIEW_SENTIMENT_HOME");

        // Test without environment variable
        let path = ModelManager::get_default_models_dir();
        assert!(path.ends_with("review-sentiment/models"));
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(sidecar_path(Path::new("/a/b/model.json")), PathBuf::from("/a/b/model.json.sha256"));
    }

    #[test]
    fn test_rejects_bad_names() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let manager = ModelManager::new(dir.path())?;
        let model = tiny_model();
        assert!(manager.save_model("", &model).is_err());
        assert!(manager.save_model("../escape", &model).is_err());
        assert!(manager.save_model("..", &model).is_err());
        Ok(())
    }

    #[test]
    fn test_load_missing_model() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let manager = ModelManager::new(dir.path())?;
        assert!(matches!(manager.load_model("nope"), Err(ModelError::NotFound(_))));
        assert!(!manager.verify_model("nope")?);
        Ok(())
    }
}
