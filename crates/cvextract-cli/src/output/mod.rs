pub mod json;
pub mod summary;

use cvextract_core::acquire::TextSource;

/// Short human label for where a document's text came from.
pub fn describe_source(source: &TextSource) -> String {
    match source {
        TextSource::Native => "native text".to_string(),
        TextSource::Ocr { pages } => format!("OCR of {pages} page(s)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_source() {
        assert_eq!(describe_source(&TextSource::Native), "native text");
        assert_eq!(
            describe_source(&TextSource::Ocr { pages: 3 }),
            "OCR of 3 page(s)"
        );
    }
}
