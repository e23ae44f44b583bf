use cvextract_core::error::CvError;
use cvextract_core::model::to_pretty_json;
use std::path::{Path, PathBuf};

use super::RunFlags;
use crate::output;

pub async fn run(
    config_file: Option<&Path>,
    pdf_file: &Path,
    output_file: Option<PathBuf>,
) -> Result<(), CvError> {
    let config = super::load(config_file, RunFlags::default())?;
    let runner = cvextract_core::build_runner(&config)?;

    let file_name = pdf_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CvError::InvalidInput(format!("'{}' has no file name", pdf_file.display())))?;

    let acquired = runner.acquire(pdf_file).await?;
    let profile = runner.parse(&file_name, &acquired.text).await?;

    match output_file {
        Some(path) => {
            std::fs::write(&path, to_pretty_json(&profile)?)?;
            eprintln!(
                "Parsed {file_name} ({}), written to {}",
                output::describe_source(&acquired.source),
                path.display()
            );
        }
        None => output::json::print(&profile)?,
    }

    Ok(())
}
