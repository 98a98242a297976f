use std::io;

use tokio::runtime::{Builder, Runtime};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0, // Let tokio decide
            thread_name: "review-sentiment-worker".to_string(),
        }
    }
}

/// Builds the multi-threaded runtime the prediction service runs on.
pub fn create_runtime(config: &RuntimeConfig) -> io::Result<Runtime> {
    let mut builder = Builder::new_multi_thread();
    builder.enable_all().thread_name(config.thread_name.clone());

    // Configure threading
    if config.worker_threads > 0 {
        builder.worker_threads(config.worker_threads);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_default_config() {
        let runtime = create_runtime(&RuntimeConfig::default());
        assert!(runtime.is_ok());
    }

    #[test]
    fn test_runtime_with_workers() {
        let config = RuntimeConfig {
            worker_threads: 2,
            ..RuntimeConfig::default()
        };
        let runtime = create_runtime(&config).expect("runtime should build");
        let answer = runtime.block_on(async { tokio::spawn(async { 40 + 2 }).await });
        assert_eq!(answer.expect("task should finish"), 42);
    }
}
