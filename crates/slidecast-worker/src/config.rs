//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use slidecast_models::SegmentEncoding;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// JSON content store
    pub store_path: PathBuf,
    /// Final videos and per-item work directories
    pub output_dir: PathBuf,
    /// Maximum slides rendered in parallel within one item
    pub max_slide_parallel: usize,
    /// Kill FFmpeg runs that exceed this
    pub ffmpeg_timeout: Duration,
    /// Keep a failed item's work directory for inspection
    pub keep_failed_workspaces: bool,
    /// Settings shared by every encoded segment
    pub encoding: SegmentEncoding,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("content.json"),
            output_dir: PathBuf::from("output"),
            max_slide_parallel: 3,
            ffmpeg_timeout: Duration::from_secs(600), // 10 minutes
            keep_failed_workspaces: false,
            encoding: SegmentEncoding::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            store_path: std::env::var("SLIDECAST_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            output_dir: std::env::var("SLIDECAST_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_slide_parallel: env_parse("SLIDECAST_MAX_SLIDE_PARALLEL", defaults.max_slide_parallel)
                .max(1),
            ffmpeg_timeout: Duration::from_secs(env_parse(
                "SLIDECAST_FFMPEG_TIMEOUT_SECS",
                defaults.ffmpeg_timeout.as_secs(),
            )),
            keep_failed_workspaces: env_parse(
                "SLIDECAST_KEEP_FAILED_WORKSPACES",
                defaults.keep_failed_workspaces,
            ),
            encoding: defaults.encoding,
        }
    }

    /// Concurrency limit, never below one.
    pub fn slide_parallelism(&self) -> usize {
        self.max_slide_parallel.max(1)
    }
}

/// Read and parse an environment variable, falling back on absence or parse failure.
pub(crate) fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read an environment variable, falling back on absence.
pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.store_path, PathBuf::from("content.json"));
        assert_eq!(config.max_slide_parallel, 3);
        assert!(!config.keep_failed_workspaces);
        assert_eq!(config.encoding.width, 1080);
    }

    #[test]
    fn test_slide_parallelism_floor() {
        let config = PipelineConfig {
            max_slide_parallel: 0,
            ..Default::default()
        };
        assert_eq!(config.slide_parallelism(), 1);
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("SLIDECAST_TEST_ENV_PARSE", "not-a-number");
        assert_eq!(env_parse("SLIDECAST_TEST_ENV_PARSE", 7usize), 7);
        std::env::set_var("SLIDECAST_TEST_ENV_PARSE", " 12 ");
        assert_eq!(env_parse("SLIDECAST_TEST_ENV_PARSE", 7usize), 12);
        std::env::remove_var("SLIDECAST_TEST_ENV_PARSE");
    }
}
