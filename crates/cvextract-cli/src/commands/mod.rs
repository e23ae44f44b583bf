pub mod doctor;
pub mod parse;
pub mod run;
pub mod text;

use cvextract_core::config::{self, BatchSection, Config, ConfigFile, ExtractionSection};
use cvextract_core::error::CvError;
use std::path::{Path, PathBuf};

/// Flags of `cvextract run` that override configured values.
#[derive(Debug, Default)]
pub struct RunFlags {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub workspace: Option<PathBuf>,
}

impl RunFlags {
    fn into_layer(self) -> ConfigFile {
        ConfigFile {
            api: None,
            extraction: self.workspace.map(|dir| ExtractionSection {
                workspace_dir: Some(dir),
                ..ExtractionSection::default()
            }),
            batch: Some(BatchSection {
                input_dir: self.input,
                output_dir: self.output,
                workers: self.workers,
            }),
        }
    }
}

/// Config files, then the environment, then command-line flags.
pub fn load(explicit: Option<&Path>, flags: RunFlags) -> Result<Config, CvError> {
    let file = config::load_config(explicit)?.with_env(|key| std::env::var(key).ok());
    config::merge(file, flags.into_layer()).resolve()
}
