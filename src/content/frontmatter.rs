//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

const DELIMITER: &[u8] = b"---";
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors produced while splitting a document into front-matter and body
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front-matter block is not closed by a `---` line")]
    Unterminated,

    #[error("invalid YAML front-matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unrecognized date: {0:?}")]
    InvalidDate(String),
}

/// Front-matter data from a post
///
/// Unknown keys are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    /// Parsed for compatibility with existing documents; the loader always
    /// derives the slug from the file name instead.
    pub slug: Option<String>,
}

impl FrontMatter {
    /// Parse front-matter from raw document bytes
    /// Returns (front_matter, remaining_body)
    ///
    /// A document that does not open with a `---` line has no front-matter
    /// and is returned whole as the body.
    pub fn parse(content: &[u8]) -> Result<(Self, &[u8]), FrontMatterError> {
        let content = content.strip_prefix(BOM).unwrap_or(content);

        let (first, mut rest) = next_line(content.trim_ascii_start());
        if !is_delimiter(first) {
            return Ok((FrontMatter::default(), content));
        }

        let yaml_start = rest;
        let mut yaml_len = 0;
        while !rest.is_empty() {
            let (line, after) = next_line(rest);
            if is_delimiter(line) {
                let yaml = &yaml_start[..yaml_len];
                let body = trim_leading_newlines(after);

                if yaml.trim_ascii().is_empty() {
                    return Ok((FrontMatter::default(), body));
                }

                let fm = serde_yaml::from_slice::<FrontMatter>(yaml)?;
                return Ok((fm, body));
            }
            yaml_len += rest.len() - after.len();
            rest = after;
        }

        Err(FrontMatterError::Unterminated)
    }

    /// Parse the date field
    ///
    /// `Ok(None)` when the field is absent, an error when it is present but
    /// in no recognized format.
    pub fn parse_date(&self) -> Result<Option<DateTime<Utc>>, FrontMatterError> {
        match self.date.as_deref() {
            None => Ok(None),
            Some(s) => parse_date_string(s)
                .map(Some)
                .ok_or_else(|| FrontMatterError::InvalidDate(s.to_string())),
        }
    }
}

fn next_line(input: &[u8]) -> (&[u8], &[u8]) {
    match input.iter().position(|&b| b == b'\n') {
        Some(i) => (&input[..i], &input[i + 1..]),
        None => (input, &[]),
    }
}

fn is_delimiter(line: &[u8]) -> bool {
    line.trim_ascii_end() == DELIMITER
}

fn trim_leading_newlines(input: &[u8]) -> &[u8] {
    let start = input
        .iter()
        .position(|&b| b != b'\n' && b != b'\r')
        .unwrap_or(input.len());
    &input[start..]
}

/// Parse a date string in various formats. Naive values are taken as UTC.
fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}
