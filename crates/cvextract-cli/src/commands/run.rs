use cvextract_core::error::CvError;
use std::path::Path;

use super::RunFlags;
use crate::output;

pub async fn run(config_file: Option<&Path>, flags: RunFlags) -> Result<(), CvError> {
    let config = super::load(config_file, flags)?;
    let runner = cvextract_core::build_runner(&config)?;

    tracing::debug!(
        input = %config.batch.input_dir.display(),
        output = %config.batch.output_dir.display(),
        workers = config.batch.workers,
        "starting batch"
    );
    let report = runner.run_dir(&config.batch.input_dir).await?;
    output::summary::print(&report);
    Ok(())
}
