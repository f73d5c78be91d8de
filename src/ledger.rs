//! The CSV ledger: output of every run and dedup source for the next one.
//!
//! # Format
//!
//! ```text
//! Ticker,Summary,Label,Confidence,URL
//! OKLO,"Oklo filed a registration statement, ...",4 stars,0.52,https://...
//! ```
//!
//! The file is append-only. The header is written once, when the file is
//! created (or found empty). URL is the last column and is the dedup key.
//! Uniqueness is only enforced by filtering candidates against
//! [`read_existing_urls`] before fetching; writes do not check it.

use crate::models::{LEDGER_HEADER, LedgerRow};
use std::collections::HashSet;
use std::error::Error;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{error, info, instrument};

/// Collect the URL column of every data row already in the ledger.
///
/// A missing file yields an empty set. Any read or parse error is logged and
/// also yields an empty set; it never stops the run.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_existing_urls(path: &Path) -> HashSet<String> {
    if !path.exists() {
        info!("Ledger does not exist yet; no URLs to skip");
        return HashSet::new();
    }
    match try_read_existing_urls(path) {
        Ok(urls) => {
            info!(count = urls.len(), "Loaded existing ledger URLs");
            urls
        }
        Err(e) => {
            error!(error = %e, "Failed to read ledger; treating it as empty");
            HashSet::new()
        }
    }
}

fn try_read_existing_urls(path: &Path) -> Result<HashSet<String>, Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut urls = HashSet::new();
    for record in reader.records() {
        let record = record?;
        if let Some(url) = record.iter().last() {
            urls.insert(url.to_string());
        }
    }
    Ok(urls)
}

/// Drop every candidate already present in `existing`, preserving order.
pub fn filter_new_urls(urls: Vec<String>, existing: &HashSet<String>) -> Vec<String> {
    urls.into_iter().filter(|u| !existing.contains(u)).collect()
}

/// Append rows to the ledger, creating it with a header row if needed.
///
/// Fields are quoted only when necessary, with embedded quotes doubled.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = rows.len()))]
pub fn append_rows(path: &Path, rows: &[LedgerRow]) -> Result<(), Box<dyn Error>> {
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if !needs_header && !ends_with_newline(path)? {
        file.write_all(b"\n")?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(file);

    if needs_header {
        writer.write_record(LEDGER_HEADER)?;
    }
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;

    info!(header_written = needs_header, "Appended rows to ledger");
    Ok(())
}

/// Whether the last byte of a non-empty file is a line feed.
fn ends_with_newline(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Render rows, header first, as CSV text.
pub fn rows_to_csv(rows: &[LedgerRow]) -> Result<String, Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(LEDGER_HEADER)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    let data = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(data)?)
}
