//! RFC4180-style CSV codec used for templates and uploads.
//!
//! Decoding is deliberately lenient: real-world spreadsheet exports are often
//! slightly malformed, so unterminated quotes are absorbed rather than
//! rejected and the caller always gets whatever fields accumulated. Encoding
//! produces CRLF lines and quotes a field only when it needs it.

use crate::model::RawRow;

/// Case needing quoting: comma, double-quote, CR or LF inside the field.
fn needs_quoting(value: &str) -> bool {
    value.contains([',', '"', '\r', '\n'])
}

fn escape_field(value: &str) -> String {
    if !needs_quoting(value) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Encode a header row plus data rows as CRLF-joined CSV text. Rows shorter
/// than the header count are right-padded with empty fields, never truncated.
pub fn encode(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| escape_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        let mut fields: Vec<String> = row.iter().map(|v| escape_field(v)).collect();
        while fields.len() < headers.len() {
            fields.push(String::new());
        }
        lines.push(fields.join(","));
    }
    lines.join("\r\n")
}

/// Decode CSV text to rows of fields with a two-state machine.
///
/// Unquoted: comma ends the field, CR/CRLF/LF ends the row, a quote opens
/// quoted mode. Quoted: `""` is a literal quote, a lone quote closes, and
/// every other character (commas and newlines included) is kept verbatim.
/// Never fails; malformed quoting yields whatever characters accumulated.
/// A trailing blank line produces no extra logical row.
pub fn decode(input: &str) -> Vec<Vec<String>> {
    let chars: Vec<char> = input.chars().collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];

        if in_quotes {
            if ch == '"' && chars.get(i + 1) == Some(&'"') {
                field.push('"');
                i += 2;
            } else if ch == '"' {
                in_quotes = false;
                i += 1;
            } else {
                field.push(ch);
                i += 1;
            }
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                i += 1;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                i += 1;
            }
            '\r' => {
                if chars.get(i + 1) == Some(&'\n') {
                    i += 1;
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                i += 1;
            }
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                i += 1;
            }
            _ => {
                field.push(ch);
                i += 1;
            }
        }
    }

    row.push(field);
    rows.push(row);

    if let Some(last) = rows.last() {
        if last.len() == 1 && last[0].is_empty() {
            rows.pop();
        }
    }

    rows
}

/// A data row paired with its human-readable source line number (line 1 is
/// the header). The index is for error messages only, not a stable identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedRow {
    pub index: usize,
    pub row: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderedCsv {
    pub headers: Vec<String>,
    pub records: Vec<IndexedRow>,
}

/// Decode and split off the header row, trimming each header name.
pub fn decode_with_headers(input: &str) -> HeaderedCsv {
    let rows = decode(input);
    if rows.is_empty() {
        return HeaderedCsv {
            headers: Vec::new(),
            records: Vec::new(),
        };
    }
    let mut iter = rows.into_iter();
    let headers = iter
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    let records = iter
        .enumerate()
        .map(|(pos, row)| IndexedRow {
            index: pos + 2,
            row,
        })
        .collect();
    HeaderedCsv { headers, records }
}

/// One parsed data row: source line index plus header-keyed trimmed cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub index: usize,
    pub raw: RawRow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

/// Turn CSV text into header-keyed raw rows. Short rows are padded with empty
/// strings, extra trailing cells are discarded, and rows whose every value is
/// empty after trimming are dropped (spreadsheet tools love trailing blanks).
/// Surviving rows keep their source line index, so the sequence downstream is
/// not necessarily contiguous.
pub fn parse_to_records(text: &str) -> ParsedCsv {
    let HeaderedCsv { headers, records } = decode_with_headers(text);

    let rows = records
        .into_iter()
        .map(|IndexedRow { index, row }| {
            let raw: RawRow = headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let value = row.get(idx).map(|v| v.trim()).unwrap_or("");
                    (header.clone(), value.to_string())
                })
                .collect();
            ParsedRow { index, raw }
        })
        .filter(|entry| entry.raw.values().any(|value| !value.is_empty()))
        .collect();

    ParsedCsv { headers, rows }
}
