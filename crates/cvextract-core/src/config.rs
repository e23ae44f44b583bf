use crate::error::CvError;
use crate::extraction::pdftoppm::DEFAULT_DPI;
use crate::normalize::DEFAULT_FLAT_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// On-disk TOML configuration.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api: Option<ApiSection>,
    pub extraction: Option<ExtractionSection>,
    pub batch: Option<BatchSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub chat_model: Option<String>,
    pub vision_model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionSection {
    pub flat_threshold: Option<usize>,
    pub dpi: Option<u32>,
    pub ocr_concurrency: Option<usize>,
    pub workspace_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSection {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub workers: Option<usize>,
}

/// Fully resolved configuration handed to each component.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub extraction: ExtractionConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub vision_model: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            api_key: None,
            base_url: DEFAULT_BASE_URL.into(),
            chat_model: DEFAULT_MODEL.into(),
            vision_model: DEFAULT_MODEL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Minimum non-whitespace characters for the native text to be accepted.
    pub flat_threshold: usize,
    pub dpi: u32,
    /// Page transcriptions in flight per document.
    pub ocr_concurrency: usize,
    /// Fixed scratch directory. `None` gives every document a temporary one.
    pub workspace_dir: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            flat_threshold: DEFAULT_FLAT_THRESHOLD,
            dpi: DEFAULT_DPI,
            ocr_concurrency: 1,
            workspace_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Documents processed concurrently.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            input_dir: PathBuf::from("./INPUT"),
            output_dir: PathBuf::from("./OUTPUT"),
            workers: 1,
        }
    }
}

/// Platform config directory path: `<config_dir>/cvextract/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cvextract").join("config.toml"))
}

/// Load config by cascading CWD `.cvextract.toml` over the platform config,
/// then `explicit` over both.
///
/// Implicit files that are missing are skipped; an explicit file must exist
/// and parse.
pub fn load_config(explicit: Option<&Path>) -> Result<ConfigFile, CvError> {
    let mut config = ConfigFile::default();
    for path in config_path()
        .into_iter()
        .chain(std::iter::once(PathBuf::from(".cvextract.toml")))
    {
        if let Some(layer) = load_from_path(&path) {
            tracing::debug!(path = %path.display(), "loaded config file");
            config = merge(config, layer);
        }
    }

    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CvError::Config(format!("cannot read {}: {e}", path.display())))?;
        let layer: ConfigFile = toml::from_str(&content)
            .map_err(|e| CvError::Config(format!("invalid {}: {e}", path.display())))?;
        config = merge(config, layer);
    }

    Ok(config)
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let api = match (base.api, overlay.api) {
        (Some(b), Some(o)) => Some(ApiSection {
            api_key: o.api_key.or(b.api_key),
            base_url: o.base_url.or(b.base_url),
            chat_model: o.chat_model.or(b.chat_model),
            vision_model: o.vision_model.or(b.vision_model),
            timeout_secs: o.timeout_secs.or(b.timeout_secs),
            max_retries: o.max_retries.or(b.max_retries),
        }),
        (b, o) => o.or(b),
    };
    let extraction = match (base.extraction, overlay.extraction) {
        (Some(b), Some(o)) => Some(ExtractionSection {
            flat_threshold: o.flat_threshold.or(b.flat_threshold),
            dpi: o.dpi.or(b.dpi),
            ocr_concurrency: o.ocr_concurrency.or(b.ocr_concurrency),
            workspace_dir: o.workspace_dir.or(b.workspace_dir),
        }),
        (b, o) => o.or(b),
    };
    let batch = match (base.batch, overlay.batch) {
        (Some(b), Some(o)) => Some(BatchSection {
            input_dir: o.input_dir.or(b.input_dir),
            output_dir: o.output_dir.or(b.output_dir),
            workers: o.workers.or(b.workers),
        }),
        (b, o) => o.or(b),
    };
    ConfigFile {
        api,
        extraction,
        batch,
    }
}

impl ConfigFile {
    /// Overlay values from environment variables.
    ///
    /// `OPENAI_API_KEY` and `OPENAI_BASE_URL` take precedence over files.
    pub fn with_env(self, lookup: impl Fn(&str) -> Option<String>) -> ConfigFile {
        let env = ConfigFile {
            api: Some(ApiSection {
                api_key: lookup("OPENAI_API_KEY"),
                base_url: lookup("OPENAI_BASE_URL"),
                ..ApiSection::default()
            }),
            ..ConfigFile::default()
        };
        merge(self, env)
    }

    /// Fill defaults and check ranges.
    pub fn resolve(self) -> Result<Config, CvError> {
        let api = self.api.unwrap_or_default();
        let extraction = self.extraction.unwrap_or_default();
        let batch = self.batch.unwrap_or_default();
        let defaults = Config::default();

        let timeout_secs = api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CvError::Config("api.timeout_secs must be positive".into()));
        }
        let ocr_concurrency = extraction
            .ocr_concurrency
            .unwrap_or(defaults.extraction.ocr_concurrency);
        if ocr_concurrency == 0 {
            return Err(CvError::Config(
                "extraction.ocr_concurrency must be at least 1".into(),
            ));
        }
        let workers = batch.workers.unwrap_or(defaults.batch.workers);
        if workers == 0 {
            return Err(CvError::Config("batch.workers must be at least 1".into()));
        }
        let dpi = extraction.dpi.unwrap_or(defaults.extraction.dpi);
        if dpi == 0 {
            return Err(CvError::Config("extraction.dpi must be positive".into()));
        }

        Ok(Config {
            api: ApiConfig {
                api_key: api.api_key,
                base_url: api.base_url.unwrap_or(defaults.api.base_url),
                chat_model: api.chat_model.unwrap_or(defaults.api.chat_model),
                vision_model: api.vision_model.unwrap_or(defaults.api.vision_model),
                timeout: Duration::from_secs(timeout_secs),
                max_retries: api.max_retries.unwrap_or(defaults.api.max_retries),
            },
            extraction: ExtractionConfig {
                flat_threshold: extraction
                    .flat_threshold
                    .unwrap_or(defaults.extraction.flat_threshold),
                dpi,
                ocr_concurrency,
                workspace_dir: extraction.workspace_dir,
            },
            batch: BatchConfig {
                input_dir: batch.input_dir.unwrap_or(defaults.batch.input_dir),
                output_dir: batch.output_dir.unwrap_or(defaults.batch.output_dir),
                workers,
            },
        })
    }
}
