use std::path::Path;

use tracing::info;

use super::error::CorpusError;
use super::types::CorpusRecord;

/// Reads one [`CorpusRecord`] per non-blank line.
pub fn load_jsonl(path: &Path) -> Result<Vec<CorpusRecord>, CorpusError> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let records = parse_jsonl(&content).map_err(|(line, reason)| CorpusError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    })?;

    info!(path = %path.display(), records = records.len(), "Loaded corpus");
    Ok(records)
}

/// Parses JSONL text. Errors carry the 1-based line number.
pub fn parse_jsonl(content: &str) -> Result<Vec<CorpusRecord>, (usize, String)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| serde_json::from_str(line).map_err(|e| (i + 1, e.to_string())))
        .collect()
}
