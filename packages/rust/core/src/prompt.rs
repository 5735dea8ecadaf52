//! Interactive capture of the search term.

use std::io::{BufRead, Write};

use scrapechain_shared::{Result, ScrapechainError, SearchTerm};

/// Text shown to the operator before reading the term.
pub const PROMPT: &str = "Enter the search term:";

/// Print [`PROMPT`] to `writer` and read one line from `reader`.
///
/// Only the line terminator is removed; spaces and any other content are kept
/// verbatim. EOF before any input yields the empty term.
pub fn read_search_term<R: BufRead, W: Write>(mut reader: R, mut writer: W) -> Result<SearchTerm> {
    write!(writer, "{PROMPT} ").map_err(ScrapechainError::Prompt)?;
    writer.flush().map_err(ScrapechainError::Prompt)?;

    let mut line = String::new();
    reader.read_line(&mut line).map_err(ScrapechainError::Prompt)?;

    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }

    Ok(SearchTerm::from(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> (SearchTerm, String) {
        let mut out = Vec::new();
        let term = read_search_term(input.as_bytes(), &mut out).expect("read term");
        (term, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn prompt_is_written_before_reading() {
        let (term, out) = read("cats\n");
        assert_eq!(term.as_str(), "cats");
        assert_eq!(out, "Enter the search term: ");
    }

    #[test]
    fn only_line_terminator_is_stripped() {
        assert_eq!(read("  big cats \n").0.as_str(), "  big cats ");
        assert_eq!(read("dogs\r\n").0.as_str(), "dogs");
    }

    #[test]
    fn empty_line_gives_empty_term() {
        assert!(read("\n").0.is_empty());
    }

    #[test]
    fn eof_gives_empty_term() {
        assert!(read("").0.is_empty());
    }

    #[test]
    fn only_first_line_is_consumed() {
        assert_eq!(read("first\nsecond\n").0.as_str(), "first");
    }
}
