use cvextract_core::batch::BatchReport;

pub fn print(report: &BatchReport) {
    println!(
        "Processed {} file(s): {} written, {} skipped",
        report.found,
        report.written.len(),
        report.skipped.len()
    );

    for path in &report.written {
        println!("  wrote    {}", path.display());
    }
    for skipped in &report.skipped {
        println!("  skipped  {}: {}", skipped.file.display(), skipped.reason);
    }
}
