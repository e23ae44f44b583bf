use cvextract_core::error::CvError;
use std::path::Path;

use super::RunFlags;
use crate::output;

pub async fn run(config_file: Option<&Path>, pdf_file: &Path) -> Result<(), CvError> {
    let config = super::load(config_file, RunFlags::default())?;
    let acquired = cvextract_core::get_content(pdf_file, &config).await?;

    eprintln!(
        "{}: {}",
        pdf_file.display(),
        output::describe_source(&acquired.source)
    );
    print!("{}", acquired.text);
    Ok(())
}
