use std::sync::Arc;
use std::thread;

use env_logger::{Builder, Env};
use review_sentiment::{
    ClassifierError, Sentiment, SentimentModel, SentimentModelBuilder, SvmConfig, TextNormalizer,
};

fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}

fn review_model() -> Result<SentimentModel, ClassifierError> {
    SentimentModel::builder()
        .add_example("I love this tablet, the screen is great", Sentiment::Positive)
        .add_example("Great value, excellent battery, love it", Sentiment::Positive)
        .add_example("Perfect for reading, works great", Sentiment::Positive)
        .add_example("Best purchase ever, my kids love it", Sentiment::Positive)
        .add_example("Terrible, it broke after a week", Sentiment::Negative)
        .add_example("Awful battery and a slow screen, returned it", Sentiment::Negative)
        .add_example("Worst tablet ever, waste of money", Sentiment::Negative)
        .add_example("Stopped charging, terrible support", Sentiment::Negative)
        .build()
}

#[test]
fn test_basic_classification() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let model = review_model()?;

    let positive = model.predict("I love this tablet, best purchase ever")?;
    assert_eq!(positive.sentiment, Sentiment::Positive);
    assert!(positive.score > 0.0);

    let negative = model.predict("Terrible tablet, a waste of money")?;
    assert_eq!(negative.sentiment, Sentiment::Negative);
    assert!(negative.score <= 0.0);
    Ok(())
}

#[test]
fn test_markup_and_case_do_not_change_prediction() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let model = review_model()?;

    let plain = model.predict("love it great screen")?;
    let noisy = model.predict("<p>LOVE it!!! <b>Great</b> screen :)</p>")?;
    assert_eq!(plain, noisy);
    Ok(())
}

#[test]
fn test_empty_comment_still_classified() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let model = review_model()?;

    let empty = model.predict("")?;
    let only_markup = model.predict("<br/> 12345 !!!")?;
    assert_eq!(empty, only_markup);
    Ok(())
}

#[test]
fn test_batch_matches_single_predictions() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let model = review_model()?;
    let texts = ["love it", "terrible", "the screen"];

    let batch = model.predict_batch(&texts)?;
    for (text, prediction) in texts.iter().zip(&batch) {
        assert_eq!(&model.predict(text)?, prediction);
    }
    Ok(())
}

#[test]
fn test_model_info() -> Result<(), Box<dyn std::error::Error>> {
    let model = review_model()?;
    let info = model.info();
    assert!(info.vocabulary_size > 10);
    assert_eq!(info.classes, vec![Sentiment::Negative, Sentiment::Positive]);
    assert!(!info.removes_stopwords);
    Ok(())
}

#[test]
fn test_stopword_removal_is_stored_in_model() -> Result<(), Box<dyn std::error::Error>> {
    let model = SentimentModelBuilder::new()
        .with_normalizer(TextNormalizer::new().with_stopword_removal(true))
        .add_example("this is great", Sentiment::Positive)
        .add_example("this is awful", Sentiment::Negative)
        .build()?;

    assert!(model.info().removes_stopwords);
    assert!(model.vectorizer().column("this").is_none());
    assert!(model.vectorizer().column("great").is_some());
    Ok(())
}

#[test]
fn test_single_sentiment_is_rejected() {
    let result = SentimentModel::builder()
        .add_example("great", Sentiment::Positive)
        .add_example("awesome", Sentiment::Positive)
        .build();
    assert!(matches!(result, Err(ClassifierError::BuildError(_))));

    let result = SentimentModel::builder().build();
    assert!(matches!(result, Err(ClassifierError::BuildError(_))));
}

#[test]
fn test_training_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let first = review_model()?;
    let second = review_model()?;
    assert_eq!(first, second);

    let reseeded = SentimentModel::builder()
        .with_svm_config(SvmConfig {
            seed: 7,
            ..SvmConfig::default()
        })
        .add_example("love it", Sentiment::Positive)
        .add_example("hate it", Sentiment::Negative)
        .build()?;
    assert_eq!(reseeded.predict("love")?.sentiment, Sentiment::Positive);
    Ok(())
}

#[test]
fn test_thread_safety() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let model = Arc::new(review_model()?);
    let expected = model.predict("love it, great tablet")?;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&model);
            thread::spawn(move || model.predict("love it, great tablet"))
        })
        .collect();

    for handle in handles {
        let prediction = handle.join().expect("prediction thread panicked")?;
        assert_eq!(prediction, expected);
    }
    Ok(())
}
