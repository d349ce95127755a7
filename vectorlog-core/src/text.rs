//! Tolerant decoder for the delimited text log format.
//!
//! Each data line reads `frame,x,y,z[,comment]`. Comment lines (`#`), blank
//! lines and the `frame,x,y,z,comment` header are not data. Lines that fail
//! to parse are dropped and recorded as [`DecodeWarning::SkippedLine`].

use crate::decoder::DecodeError;
use crate::types::{DecodeResult, DecodeWarning, Record, Sample, SkipReason};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Field separator.
pub const DELIMITER: char = ',';

/// First field of the header line.
pub const HEADER_FIELD: &str = "frame";

/// Outcome of looking at a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Blank, comment, or header line
    NotData,
    /// Successfully parsed record
    Data(Record),
    /// Malformed data line
    Malformed(SkipReason),
}

/// Classifies and parses one line.
pub fn parse_line(line: &str) -> LineKind {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return LineKind::NotData;
    }

    let fields: Vec<&str> = line.splitn(5, DELIMITER).collect();
    if fields[0].trim() == HEADER_FIELD {
        return LineKind::NotData;
    }
    if fields.len() < 4 {
        return LineKind::Malformed(SkipReason::TooFewFields {
            found: fields.len(),
        });
    }

    let frame = match fields[0].trim().parse::<u64>() {
        Ok(frame) => frame,
        Err(_) => return LineKind::Malformed(SkipReason::InvalidFrame),
    };

    let parse_field = |value: &str, field: &'static str| -> Result<Option<u64>, SkipReason> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse()
            .map(Some)
            .map_err(|_| SkipReason::InvalidField { field })
    };

    let coords = parse_field(fields[1], "x").and_then(|x| {
        let y = parse_field(fields[2], "y")?;
        let z = parse_field(fields[3], "z")?;
        Ok((x, y, z))
    });
    let (x, y, z) = match coords {
        Ok(coords) => coords,
        Err(reason) => return LineKind::Malformed(reason),
    };

    let comment = fields
        .get(4)
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string());

    LineKind::Data(Record::Sample(Sample {
        frame,
        x,
        y,
        z,
        comment,
    }))
}

/// Returns a lazy iterator of records over `lines`.
///
/// Malformed lines are skipped silently; use [`TextDecoder`] to collect
/// skip reasons.
pub fn records<I, S>(lines: I) -> impl Iterator<Item = Record>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines.into_iter().filter_map(|line| match parse_line(line.as_ref()) {
        LineKind::Data(record) => Some(record),
        LineKind::NotData | LineKind::Malformed(_) => None,
    })
}

/// Line-oriented text log decoder.
///
/// Tracks the current line number so skipped lines can be reported.
#[derive(Debug, Default)]
pub struct TextDecoder {
    line_number: usize,
    warnings: Vec<DecodeWarning>,
}

impl TextDecoder {
    /// Creates a new decoder starting at line 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the line counter and drops collected warnings.
    pub fn reset(&mut self) {
        self.line_number = 0;
        self.warnings.clear();
    }

    /// Decodes the next line of the stream.
    pub fn decode_line(&mut self, line: &str) -> Option<Record> {
        self.line_number += 1;

        match parse_line(line) {
            LineKind::Data(record) => Some(record),
            LineKind::NotData => None,
            LineKind::Malformed(reason) => {
                log::debug!("Skipping line {}: {}", self.line_number, reason);
                self.warnings.push(DecodeWarning::SkippedLine {
                    line: self.line_number,
                    reason,
                });
                None
            }
        }
    }

    /// Decodes a complete sequence of lines.
    pub fn decode_lines<I, S>(&mut self, lines: I) -> DecodeResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reset();
        let records = lines
            .into_iter()
            .filter_map(|line| self.decode_line(line.as_ref()))
            .collect();
        self.take_result(records)
    }

    /// Decodes an in-memory text log.
    pub fn decode_str(&mut self, text: &str) -> DecodeResult {
        self.decode_lines(text.lines())
    }

    /// Decodes a text log from a reader.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn decode_reader<R: BufRead>(
        &mut self,
        mut reader: R,
    ) -> Result<DecodeResult, DecodeError> {
        self.reset();

        let mut records = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            if let Some(record) = self.decode_line(&line) {
                records.push(record);
            }
        }

        Ok(self.take_result(records))
    }

    /// Decodes a text log file from disk.
    pub fn decode_file<P: AsRef<Path>>(&mut self, path: P) -> Result<DecodeResult, DecodeError> {
        let file = File::open(path.as_ref())?;
        self.decode_reader(BufReader::new(file))
    }

    fn take_result(&mut self, records: Vec<Record>) -> DecodeResult {
        DecodeResult {
            records,
            warnings: std::mem::take(&mut self.warnings),
            header: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(frame: u64, x: Option<u64>, y: Option<u64>, z: Option<u64>) -> Sample {
        Sample {
            frame,
            x,
            y,
            z,
            comment: None,
        }
    }

    #[test]
    fn test_parse_full_line() {
        assert_eq!(
            parse_line("3,100,200,4095,corner"),
            LineKind::Data(Record::Sample(
                Sample::new(3, 100, 200, 4095).with_comment("corner")
            ))
        );
    }

    #[test]
    fn test_parse_empty_fields() {
        assert_eq!(
            parse_line("5,,,0,BLANK"),
            LineKind::Data(Record::Sample(
                sample(5, None, None, Some(0)).with_comment("BLANK")
            ))
        );
        assert_eq!(
            parse_line("5,1,2,"),
            LineKind::Data(Record::Sample(sample(5, Some(1), Some(2), None)))
        );
        // Empty comment field is no comment
        assert_eq!(
            parse_line("5,1,2,3,"),
            LineKind::Data(Record::Sample(Sample::new(5, 1, 2, 3)))
        );
    }

    #[test]
    fn test_non_data_lines() {
        assert_eq!(parse_line(""), LineKind::NotData);
        assert_eq!(parse_line("   \r"), LineKind::NotData);
        assert_eq!(parse_line("# Total Points: 42"), LineKind::NotData);
        assert_eq!(parse_line("frame,x,y,z,comment"), LineKind::NotData);
        assert_eq!(parse_line("frame"), LineKind::NotData);
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(
            parse_line("abc,1,2,3"),
            LineKind::Malformed(SkipReason::InvalidFrame)
        );
        assert_eq!(
            parse_line("-1,1,2,3"),
            LineKind::Malformed(SkipReason::InvalidFrame)
        );
        assert_eq!(
            parse_line("1,2,3"),
            LineKind::Malformed(SkipReason::TooFewFields { found: 3 })
        );
        assert_eq!(
            parse_line("0,,,Frame start"),
            LineKind::Malformed(SkipReason::InvalidField { field: "z" })
        );
        assert_eq!(
            parse_line("0,1.5,2,3"),
            LineKind::Malformed(SkipReason::InvalidField { field: "x" })
        );
    }

    #[test]
    fn test_coordinates_wider_than_32_bits() {
        assert_eq!(
            parse_line("0,99999999999,1,1"),
            LineKind::Data(Record::Sample(Sample::new(0, 99_999_999_999, 1, 1)))
        );
        assert_eq!(
            parse_line("0,1,2,99999999999999999999"),
            LineKind::Malformed(SkipReason::InvalidField { field: "z" })
        );
    }

    #[test]
    fn test_comment_keeps_commas() {
        let LineKind::Data(Record::Sample(sample)) = parse_line("1,2,3,4,a,b,c") else {
            panic!("expected a sample");
        };
        assert_eq!(sample.comment.as_deref(), Some("a,b,c"));
    }

    #[test]
    fn test_whitespace_around_numbers() {
        assert_eq!(
            parse_line(" 7, 10 ,20,30\r\n"),
            LineKind::Data(Record::Sample(Sample::new(7, 10, 20, 30)))
        );
    }

    #[test]
    fn test_decoder_reports_line_numbers() {
        let text = "frame,x,y,z,comment\n0,1,2,3,\nabc,1,2,3\n\n1,4,5,6\n0,,,Frame start\n";
        let result = TextDecoder::new().decode_str(text);

        assert_eq!(
            result.records,
            vec![
                Record::Sample(Sample::new(0, 1, 2, 3)),
                Record::Sample(Sample::new(1, 4, 5, 6)),
            ]
        );
        assert_eq!(
            result.warnings,
            vec![
                DecodeWarning::SkippedLine {
                    line: 3,
                    reason: SkipReason::InvalidFrame
                },
                DecodeWarning::SkippedLine {
                    line: 6,
                    reason: SkipReason::InvalidField { field: "z" }
                },
            ]
        );
        assert!(result.header.is_none());
    }

    #[test]
    fn test_decode_reader_lossy_utf8() {
        let bytes: &[u8] = b"0,1,2,3,caf\xE9\n1,4,5,6\n";
        let result = TextDecoder::new().decode_reader(bytes).unwrap();

        assert_eq!(result.records.len(), 2);
        let comment = result.records[0].as_sample().and_then(|s| s.comment.clone());
        assert_eq!(comment.as_deref(), Some("caf\u{FFFD}"));
    }

    #[test]
    fn test_lazy_records_match_decoder() {
        let lines = ["# device log", "0,1,2,3", "bad", "0,4,5,6,x"];
        let lazy: Vec<Record> = records(lines).collect();
        let eager = TextDecoder::new().decode_lines(lines).records;
        assert_eq!(lazy, eager);
        assert_eq!(lazy.len(), 2);
    }
}
