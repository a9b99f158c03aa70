// CSV upload decoding and parsing

use std::str::FromStr;

use crate::error::ImportError;

/// Field separator of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Colon,
    Tab,
    /// Guess from the first lines of the file
    Auto,
}

impl Delimiter {
    fn byte_for(&self, content: &str) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Semicolon => b';',
            Self::Colon => b':',
            Self::Tab => b'\t',
            Self::Auto => sniff_delimiter(content),
        }
    }
}

impl FromStr for Delimiter {
    type Err = ImportError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().as_str() {
            "comma" | "," => Ok(Self::Comma),
            "semicolon" | ";" => Ok(Self::Semicolon),
            "colon" | ":" => Ok(Self::Colon),
            "tab" | "\\t" | "\t" => Ok(Self::Tab),
            "auto" => Ok(Self::Auto),
            _ => Err(ImportError::UnknownDelimiter(name.to_string())),
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, colon), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b':'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Decode uploaded bytes to UTF-8.
///
/// `encoding` is a WHATWG label (`UTF-8`, `ISO-8859-1`, `windows-1252`, ...) or
/// `auto`, which tries UTF-8 and falls back to Windows-1252 (common for
/// Excel-exported CSVs). A byte order mark is always dropped.
pub fn decode(bytes: &[u8], encoding: &str) -> Result<String, ImportError> {
    if encoding.eq_ignore_ascii_case("auto") {
        let text = match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(e) => {
                let bytes = e.into_bytes();
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
                decoded.into_owned()
            }
        };
        return Ok(text.trim_start_matches('\u{feff}').to_string());
    }

    let enc = encoding_rs::Encoding::for_label(encoding.trim().as_bytes())
        .ok_or_else(|| ImportError::UnknownEncoding(encoding.to_string()))?;

    // decode() sniffs and strips a BOM, which may override the requested encoding
    let (decoded, used, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(ImportError::Decode { encoding: used.name().to_string() });
    }
    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Header and data rows of an upload, after structural checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUpload {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Split decoded content into header and rows.
///
/// Header cells are trimmed. Blank lines are skipped. The upload is rejected
/// when it has no header, repeats a header name, or has a row whose field
/// count differs from the header.
pub fn parse(content: &str, delimiter: Delimiter) -> Result<ParsedUpload, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.byte_for(content))
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => return Err(ImportError::EmptyFile),
    };
    let columns: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();

    for (i, name) in columns.iter().enumerate() {
        if columns[..i].contains(name) {
            return Err(ImportError::DuplicateField(name.clone()));
        }
    }

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result?;
        if record.len() != columns.len() {
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);
            return Err(ImportError::WeirdColumns {
                line,
                expected: columns.len(),
                found: record.len(),
            });
        }
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }

    Ok(ParsedUpload { columns, rows })
}
