use cvextract_core::config;
use cvextract_core::error::{CvError, POPPLER_HINT};
use cvextract_core::extraction::pdftoppm::PdftoppmRasterizer;
use cvextract_core::extraction::pdftotext::PdftotextExtractor;
use std::path::Path;

use super::RunFlags;

/// Report what a batch run would need. Fails if anything is missing.
pub fn run(config_file: Option<&Path>) -> Result<(), CvError> {
    let config = super::load(config_file, RunFlags::default())?;
    let mut missing = Vec::new();

    let pdftotext = PdftotextExtractor::is_available();
    let pdftoppm = PdftoppmRasterizer::is_available();
    println!("pdftotext      {}", status(pdftotext));
    println!("pdftoppm       {}", status(pdftoppm));
    if !pdftotext {
        missing.push("pdftotext");
    }
    if !pdftoppm {
        missing.push("pdftoppm");
    }

    let has_key = config.api.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
    println!("api key        {}", if has_key { "set" } else { "missing (OPENAI_API_KEY)" });
    if !has_key {
        missing.push("api key");
    }

    println!("endpoint       {}", config.api.base_url);
    println!(
        "models         chat={} vision={}",
        config.api.chat_model, config.api.vision_model
    );
    match config::config_path() {
        Some(path) if path.exists() => println!("config file    {}", path.display()),
        Some(path) => println!("config file    {} (not present)", path.display()),
        None => println!("config file    (no platform config directory)"),
    }
    println!(
        "batch          {} -> {} ({} worker(s))",
        config.batch.input_dir.display(),
        config.batch.output_dir.display(),
        config.batch.workers
    );

    if !pdftotext || !pdftoppm {
        eprintln!("\n{POPPLER_HINT}");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CvError::Config(format!("missing: {}", missing.join(", "))))
    }
}

fn status(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "not found"
    }
}
