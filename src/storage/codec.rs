//! Delimited text codec for log lines.
//!
//! One record per line, fields separated by commas. A field is quoted when
//! it contains a comma, a newline or a double quote; quotes inside a quoted
//! field are doubled. Decoding never fails: malformed input is accumulated
//! as best it can be, so an unterminated quote swallows the rest of the line.

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Escapes a single field for output.
pub fn escape_field(value: &str) -> String {
    if value.contains(DELIMITER) || value.contains('\n') || value.contains(QUOTE) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Encodes an ordered list of fields as one delimited line (no terminator).
pub fn encode<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Decodes one delimited line back into its fields.
///
/// An empty trailing field still produces an empty string, so `"a,"`
/// decodes to two fields.
pub fn decode(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            QUOTE if in_quotes && chars.peek() == Some(&QUOTE) => {
                current.push(QUOTE);
                chars.next();
            }
            QUOTE => in_quotes = !in_quotes,
            DELIMITER if !in_quotes => values.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    values.push(current);
    values
}
