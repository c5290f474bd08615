//! Minimal RFC 4180 reader and writer.
//!
//! Fields are separated by commas and records by CRLF or LF. A field wrapped
//! in double quotes may contain commas, line breaks and `""` escapes.

use crate::error::{Result, SyncError};

/// Splits `data` into records. Blank lines are dropped; a leading UTF-8 BOM
/// is ignored.
pub fn parse_records(data: &str) -> Result<Vec<Vec<String>>> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut line = 1usize;
    let mut chars = data.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() && !field_was_quoted => {
                in_quotes = true;
                field_was_quoted = true;
            }
            '"' => {
                return Err(SyncError::Parse(format!(
                    "line {line}: unexpected quote inside unquoted field"
                )));
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_was_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                field_was_quoted = false;
                push_record(&mut records, std::mem::take(&mut record));
                line += 1;
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(SyncError::Parse(format!(
            "line {line}: unterminated quoted field"
        )));
    }
    if !field.is_empty() || field_was_quoted || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !blank {
        records.push(record);
    }
}

/// Quotes a field when it holds a comma, quote or line break.
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn write_record<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field.as_ref()));
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_quoted_fields() {
        let data = "name,number\r\nAna,0917\n\"Cruz, Juan\",\"09\"\"18\"\n";
        let records = parse_records(data).unwrap();
        assert_eq!(
            records,
            vec![
                vec!["name", "number"],
                vec!["Ana", "0917"],
                vec!["Cruz, Juan", "09\"18"],
            ]
        );
    }

    #[test]
    fn keeps_line_breaks_inside_quotes_and_skips_blank_lines() {
        let data = "\u{feff}a,b\n\n\"line one\nline two\",x";
        let records = parse_records(data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1][0], "line one\nline two");
        assert_eq!(records[1][1], "x");
    }

    #[test]
    fn empty_trailing_fields_are_kept() {
        let records = parse_records("a,,\n").unwrap();
        assert_eq!(records, vec![vec!["a", "", ""]]);
        let records = parse_records("\"\",x").unwrap();
        assert_eq!(records, vec![vec!["", "x"]]);
    }

    #[test]
    fn rejects_broken_quoting() {
        let err = parse_records("a,\"open\nb").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
        let err = parse_records("a,b\"c\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn writer_quotes_only_when_needed() {
        let mut out = String::new();
        write_record(&mut out, &["plain", "with, comma", "say \"hi\"", "two\nlines"]);
        assert_eq!(
            out,
            "plain,\"with, comma\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n"
        );
        assert_eq!(parse_records(&out).unwrap()[0][2], "say \"hi\"");
    }
}
