//! Section header classification.

/// A classified Markdown section header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading<'a> {
    /// Number of leading `#` characters (1–3).
    pub level: u8,
    /// Header text with the hashes and surrounding whitespace stripped.
    pub text: &'a str,
}

/// Classify a line as a section header: 1 to 3 leading `#` characters
/// followed by whitespace. Deeper headings and bare `#word` lines are
/// ordinary content.
pub fn heading_of(line: &str) -> Option<Heading<'_>> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.chars().next()?.is_whitespace() {
        return None;
    }
    Some(Heading {
        level: hashes as u8,
        text: rest.trim(),
    })
}
