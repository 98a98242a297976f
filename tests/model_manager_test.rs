use std::fs;

use review_sentiment::{ModelError, ModelManager, Sentiment, SentimentModel, TextNormalizer};

fn trained_model() -> Result<SentimentModel, Box<dyn std::error::Error>> {
    Ok(SentimentModel::builder()
        .with_normalizer(TextNormalizer::new().with_stopword_removal(true))
        .add_example("love this tablet, great screen", Sentiment::Positive)
        .add_example("excellent battery life", Sentiment::Positive)
        .add_example("terrible, it broke", Sentiment::Negative)
        .add_example("awful speakers, returned it", Sentiment::Negative)
        .build()?)
}

#[test]
fn test_save_and_load_named_model() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    let model = trained_model()?;

    assert!(!manager.is_model_saved("reviews"));
    let hash = manager.save_model("reviews", &model)?;
    assert_eq!(hash.len(), 64);
    assert!(manager.is_model_saved("reviews"));
    assert!(manager.verify_model("reviews")?);

    let loaded = manager.load_model("reviews")?;
    assert_eq!(loaded, model);
    for text in ["great screen", "it broke", "", "<b>meh</b>"] {
        assert_eq!(loaded.predict(text)?, model.predict(text)?);
    }
    assert!(loaded.info().removes_stopwords);
    Ok(())
}

#[test]
fn test_save_overwrites_previous_version() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;

    let first = trained_model()?;
    manager.save_model("reviews", &first)?;

    let second = SentimentModel::builder()
        .add_example("good", Sentiment::Positive)
        .add_example("bad", Sentiment::Negative)
        .build()?;
    manager.save_model("reviews", &second)?;

    assert_eq!(manager.load_model("reviews")?, second);
    Ok(())
}

#[test]
fn test_tampered_model_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    manager.save_model("reviews", &trained_model()?)?;

    let path = manager.get_model_path("reviews");
    let mut bytes = fs::read(&path)?;
    bytes.push(b' ');
    fs::write(&path, bytes)?;

    assert!(!manager.verify_model("reviews")?);
    assert!(matches!(
        manager.load_model("reviews"),
        Err(ModelError::HashMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_remove_model() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    manager.save_model("reviews", &trained_model()?)?;

    manager.remove_model("reviews")?;
    assert!(!manager.is_model_saved("reviews"));
    assert!(matches!(manager.load_model("reviews"), Err(ModelError::NotFound(_))));

    // removing twice is fine
    manager.remove_model("reviews")?;
    Ok(())
}

#[test]
fn test_explicit_path_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("sentiment.json");
    let model = trained_model()?;

    ModelManager::save_to_path(&path, &model)?;
    assert!(dir.path().join("nested").join("sentiment.json.sha256").exists());
    assert_eq!(ModelManager::load_from_path(&path)?, model);
    Ok(())
}

#[test]
fn test_explicit_path_without_checksum_still_loads() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sentiment.json");
    let model = trained_model()?;

    ModelManager::save_to_path(&path, &model)?;
    fs::remove_file(dir.path().join("sentiment.json.sha256"))?;
    assert_eq!(ModelManager::load_from_path(&path)?, model);
    Ok(())
}

#[test]
fn test_invalid_artifacts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    let missing = dir.path().join("missing.json");
    assert!(matches!(ModelManager::load_from_path(&missing), Err(ModelError::NotFound(_))));

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, b"{\"not\": \"a model\"}")?;
    assert!(matches!(
        ModelManager::load_from_path(&garbage),
        Err(ModelError::SerializationError(_))
    ));
    Ok(())
}
