/// Below this many non-whitespace characters a document is treated as a
/// scanned image. Chosen empirically on real resumes.
pub const DEFAULT_FLAT_THRESHOLD: usize = 1000;

/// Normalize extracted text into a canonical shape.
///
/// Steps:
/// 1. Split on `\n`
/// 2. Collapse every whitespace run inside a line to a single space, trim edges
/// 3. Rejoin with `\n`
/// 4. Collapse three or more consecutive newlines to exactly two
pub fn normalize_text(text: &str) -> String {
    let joined = text
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    let mut result = String::with_capacity(joined.len());
    let mut newline_run = 0usize;
    for c in joined.chars() {
        if c == '\n' {
            newline_run += 1;
            if newline_run > 2 {
                continue;
            }
        } else {
            newline_run = 0;
        }
        result.push(c);
    }
    result
}

/// Number of characters that are not whitespace.
pub fn non_whitespace_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Whether the text layer is too thin to be a real text PDF.
///
/// Exactly `threshold` characters counts as real text, unlike a
/// `count > threshold` acceptance check, which would send such a document to OCR.
pub fn is_flat(normalized_text: &str, threshold: usize) -> bool {
    non_whitespace_len(normalized_text) < threshold
}
