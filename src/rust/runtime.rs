use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use std::sync::Once;
use log::error;

static INIT: Once = Once::new();

/// ONNX Runtime settings used when a model session is created.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 1, // Single-row inference gains nothing from more
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

impl RuntimeConfig {
    /// Parses an optimization level name as accepted on the command line.
    pub fn parse_level(name: &str) -> Option<GraphOptimizationLevel> {
        match name.to_ascii_lowercase().as_str() {
            "disable" | "0" => Some(GraphOptimizationLevel::Disable),
            "level1" | "1" => Some(GraphOptimizationLevel::Level1),
            "level2" | "2" => Some(GraphOptimizationLevel::Level2),
            "level3" | "3" => Some(GraphOptimizationLevel::Level3),
            _ => None,
        }
    }
}

fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

fn init_onnx_environment() -> OrtResult<()> {
    ort::init()
        .with_name("medipredict")
        .commit()?;
    Ok(())
}

/// Initializes the process-wide ONNX Runtime environment exactly once.
pub fn ensure_initialized() {
    INIT.call_once(|| {
        if let Err(e) = init_onnx_environment() {
            // Session creation falls back to the default environment
            error!("Failed to initialize ONNX Runtime environment: {}", e);
        }
    });
}

pub fn create_session_builder(config: &RuntimeConfig) -> OrtResult<SessionBuilder> {
    ensure_initialized();
    let mut builder = Session::builder()?;

    // Configure threading
    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(copy_level(&config.optimization_level))?;

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert!(matches!(RuntimeConfig::parse_level("level1"), Some(GraphOptimizationLevel::Level1)));
        assert!(matches!(RuntimeConfig::parse_level("3"), Some(GraphOptimizationLevel::Level3)));
        assert!(matches!(RuntimeConfig::parse_level("Disable"), Some(GraphOptimizationLevel::Disable)));
        assert!(RuntimeConfig::parse_level("fast").is_none());
    }

    #[test]
    fn test_config_clone_keeps_level() {
        let config = RuntimeConfig {
            inter_threads: 2,
            intra_threads: 2,
            optimization_level: GraphOptimizationLevel::Level1,
        };
        let cloned = config.clone();
        assert_eq!(cloned.inter_threads, 2);
        assert!(matches!(cloned.optimization_level, GraphOptimizationLevel::Level1));
    }
}
