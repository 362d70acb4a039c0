use crate::error::{ReportError, ReportResult};
use crate::locale::Locale;
use encoding_rs::{EncoderResult, Encoding, UTF_8};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};
use tracing::info;

pub fn resolve_encoding(label: &str) -> ReportResult<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ReportError::UnknownEncoding(label.to_string()))
}

/// Transcode `text` to `encoding`; characters it cannot represent become `?`.
pub fn from_utf8(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    if encoding == UTF_8 {
        return text.as_bytes().to_vec();
    }
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len() + 16);
    let mut src = text;
    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(src.len())
            .unwrap_or(src.len() * 4 + 16);
        out.reserve(needed);
        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(src, &mut out, true);
        src = &src[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(_) => out.push(b'?'),
        }
    }
    out
}

/// Serialize text rows as CSV using the locale's column separator, each
/// cell transcoded to the locale's export encoding.
pub fn encode_csv(rows: &[Vec<String>], locale: &Locale) -> ReportResult<Vec<u8>> {
    if !locale.csv_separator.is_ascii() {
        return Err(ReportError::InvalidSeparator(locale.csv_separator.to_string()));
    }
    let encoding = resolve_encoding(&locale.csv_encoding)?;
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(locale.csv_separator as u8)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        wtr.write_record(row.iter().map(|cell| from_utf8(cell, encoding)))?;
    }
    wtr.flush()?;
    wtr.into_inner().map_err(|e| ReportError::Io(e.into_error()))
}

pub fn write_bytes(path: impl AsRef<Path>, bytes: &[u8]) -> ReportResult<()> {
    let path = path.as_ref();
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote export");
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> ReportResult<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown preview of the header plus the first `max_rows` data rows.
pub fn preview_rows(rows: &[Vec<String>], max_rows: usize) {
    if rows.len() <= 1 {
        println!("(no rows)\n");
        return;
    }
    let mut builder = Builder::default();
    for row in rows.iter().take(max_rows + 1) {
        builder.push_record(row.clone());
    }
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}", table_str);
    if rows.len() > max_rows + 1 {
        println!("... {} more rows", rows.len() - max_rows - 1);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(v: &[&[&str]]) -> Vec<Vec<String>> {
        v.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect()
    }

    #[test]
    fn latin1_export_transcodes_and_replaces_unmappable() {
        let enc = resolve_encoding("ISO-8859-1").unwrap();
        assert_eq!(from_utf8("Activité", enc), b"Activit\xe9".to_vec());
        assert_eq!(from_utf8("a\u{4e2d}b", enc), b"a?b".to_vec());
        assert_eq!(from_utf8("5\u{20ac}", enc), b"5\x80".to_vec());
    }

    #[test]
    fn uses_locale_separator_and_quotes_when_needed() {
        let locale = Locale::for_code("fr");
        let out = encode_csv(&rows(&[&["Heures", "a;b"], &["3,50", ""]]), &locale).unwrap();
        assert_eq!(out, b"Heures;\"a;b\"\n3,50;\n".to_vec());
    }

    #[test]
    fn utf8_locale_passes_text_through() {
        let mut locale = Locale::default();
        locale.csv_encoding = "UTF-8".to_string();
        let out = encode_csv(&rows(&[&["中文", "x"]]), &locale).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "中文,x\n");
    }

    #[test]
    fn rejects_bad_encoding_and_separator() {
        let mut locale = Locale::default();
        locale.csv_encoding = "klingon".to_string();
        assert!(matches!(encode_csv(&[], &locale), Err(ReportError::UnknownEncoding(_))));
        let mut locale = Locale::default();
        locale.csv_separator = '§';
        assert!(matches!(encode_csv(&[], &locale), Err(ReportError::InvalidSeparator(_))));
    }
}
