/// Portfolio CSV loading.
///
/// The table has two required columns, `Techstack` and `Links`; any other columns are
/// ignored. The SHA-256 of the raw file bytes is the table's fingerprint, used to decide
/// whether the vector index is still current.
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::model::PortfolioEntry;

pub const TECH_STACK_COLUMN: &str = "Techstack";
pub const LINKS_COLUMN: &str = "Links";

#[derive(Debug, Clone)]
pub struct PortfolioTable {
    pub entries: Vec<PortfolioEntry>,
    /// Lowercase hex SHA-256 of the CSV bytes
    pub fingerprint: String,
}

pub fn load_portfolio(path: &Path) -> Result<PortfolioTable, AppError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::Portfolio(format!("failed to read {}: {e}", path.display())))?;
    parse_portfolio(&bytes)
}

pub fn parse_portfolio(bytes: &[u8]) -> Result<PortfolioTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::Portfolio(format!("unreadable header row: {e}")))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AppError::Portfolio(format!("missing column `{name}`")))
    };
    let tech_idx = column(TECH_STACK_COLUMN)?;
    let link_idx = column(LINKS_COLUMN)?;

    let mut entries = Vec::new();
    for (row, record) in reader.records().enumerate() {
        // 1-based file line; the header is line 1.
        let line = row + 2;
        let record = record.map_err(|e| AppError::Portfolio(format!("row {line}: {e}")))?;
        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .map(str::to_string)
                .ok_or_else(|| AppError::Portfolio(format!("row {line}: missing `{name}`")))
        };
        entries.push(PortfolioEntry {
            id: uuid::Uuid::new_v4().to_string(),
            tech_stack: field(tech_idx, TECH_STACK_COLUMN)?,
            link: field(link_idx, LINKS_COLUMN)?,
        });
    }

    Ok(PortfolioTable {
        entries,
        fingerprint: fingerprint(bytes),
    })
}

fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ROWS: &str = "Techstack,Links\n\"Python, Pandas\",http://a\n\"React, Node\",http://b\n";

    #[test]
    fn parses_rows_with_fresh_ids() {
        let table = parse_portfolio(TWO_ROWS.as_bytes()).unwrap();
        assert_eq!(table.entries.len(), 2);
        assert_eq!(table.entries[0].tech_stack, "Python, Pandas");
        assert_eq!(table.entries[0].link, "http://a");
        assert_eq!(table.entries[1].link, "http://b");
        assert_ne!(table.entries[0].id, table.entries[1].id);
        assert!(uuid::Uuid::parse_str(&table.entries[0].id).is_ok());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = parse_portfolio(TWO_ROWS.as_bytes()).unwrap();
        let b = parse_portfolio(TWO_ROWS.as_bytes()).unwrap();
        let changed = parse_portfolio(b"Techstack,Links\nRust,http://c\n").unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, changed.fingerprint);
        assert_eq!(a.fingerprint.len(), 64);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let table =
            parse_portfolio(b"Owner,Links,Techstack\nann,http://x,Go\n").unwrap();
        assert_eq!(table.entries[0].tech_stack, "Go");
        assert_eq!(table.entries[0].link, "http://x");
    }

    #[test]
    fn missing_column_is_reported() {
        let err = parse_portfolio(b"Techstack,Url\nGo,http://x\n").unwrap_err();
        assert_eq!(err.to_string(), "portfolio error: missing column `Links`");
    }

    #[test]
    fn ragged_row_is_reported() {
        let err = parse_portfolio(b"Techstack,Links\nGo,http://x\nRust\n").unwrap_err();
        assert!(err.to_string().contains("row 3"), "{err}");
    }

    #[test]
    fn missing_file_is_portfolio_error() {
        let err = load_portfolio(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, AppError::Portfolio(_)));
    }
}
