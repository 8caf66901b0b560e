// Input record parsing and error-line synthesis

/// Marker text for records that could not be annotated.
pub const ERROR_MARKER: &str = "*** error ***";

/// One input record: an opaque id and the text to annotate.
///
/// Parsed from a `<id>|<text>` line. The id is preserved verbatim in the
/// output, whether the record succeeds or fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub id: String,
    pub text: String,
}

impl LineRecord {
    /// Parse one input line, splitting on the first `|`. Pipes after the
    /// first belong to the text. Returns `None` for lines with no delimiter.
    pub fn parse(line: &str) -> Option<LineRecord> {
        let (id, text) = line.split_once('|')?;
        Some(LineRecord {
            id: id.to_string(),
            text: text.to_string(),
        })
    }

    /// Whitespace-separated word count of the text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// The raw input line this record was parsed from.
    pub fn raw_line(&self) -> String {
        format!("{}|{}", self.id, self.text)
    }
}

/// Synthesized output line marking a record that could not be annotated.
pub fn error_line(id: &str) -> String {
    format!("{}|{}", id, ERROR_MARKER)
}
