pub mod acquire;
pub mod batch;
pub mod config;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod model;
pub mod normalize;
pub mod profile;
pub mod validate;

use acquire::{AcquiredText, Acquirer};
use batch::BatchRunner;
use config::Config;
use error::CvError;
use extraction::pdftoppm::PdftoppmRasterizer;
use extraction::pdftotext::PdftotextExtractor;
use extraction::workspace::Workspace;
use llm::openai::OpenAiClient;
use llm::{BoxFuture, VisionClient};
use std::path::Path;
use std::sync::Arc;

/// Acquirer backed by poppler (pdftotext, pdftoppm) and the given vision client.
pub fn poppler_acquirer(config: &Config, vision: Arc<dyn VisionClient>) -> Acquirer {
    Acquirer::new(
        Arc::new(PdftotextExtractor::new()),
        Arc::new(PdftoppmRasterizer::new(config.extraction.dpi)),
        vision,
        &config.extraction,
    )
}

/// Batch runner with poppler backends and one OpenAI-compatible client for
/// both chat and vision requests.
pub fn build_runner(config: &Config) -> Result<BatchRunner, CvError> {
    let client = Arc::new(OpenAiClient::new(&config.api)?);
    let acquirer = poppler_acquirer(config, client.clone());
    Ok(BatchRunner::new(acquirer, client, config))
}

/// Main API entry point: recover the plain text of one PDF.
///
/// Uses the configured fixed workspace if there is one, otherwise a
/// temporary directory that is removed before returning. Text PDFs work
/// without API credentials; only the OCR fallback needs them.
pub async fn get_content(path: &Path, config: &Config) -> Result<AcquiredText, CvError> {
    let vision: Arc<dyn VisionClient> = match OpenAiClient::new(&config.api) {
        Ok(client) => Arc::new(client),
        Err(e) => Arc::new(VisionUnavailable(e.to_string())),
    };
    let acquirer = poppler_acquirer(config, vision);
    let workspace = match &config.extraction.workspace_dir {
        Some(dir) => Workspace::at(dir),
        None => Workspace::temporary()?,
    };
    acquirer.get_content(path, &workspace).await
}

/// Stands in for the vision client when it cannot be built.
struct VisionUnavailable(String);

impl VisionClient for VisionUnavailable {
    fn transcribe<'a>(&'a self, _image: &'a extraction::PageImage) -> BoxFuture<'a, Result<String, CvError>> {
        let reason = self.0.clone();
        Box::pin(async move { Err(CvError::Config(reason)) })
    }
}
