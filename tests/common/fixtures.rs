//! Basketball corpus and structured rows used across integration tests.

use std::io::Write;

use sift::{CandidateMetadata, CorpusRecord, StructuredRows};
use tempfile::NamedTempFile;

pub const DIM: usize = 64;

fn post(id: &str, text: &str, upvotes: u64, comments: u64) -> CorpusRecord {
    CorpusRecord::new(id, text).with_metadata(CandidateMetadata {
        upvotes,
        comments,
        authoritative: false,
        source: Some("r/nba".to_string()),
    })
}

fn recap(id: &str, text: &str) -> CorpusRecord {
    CorpusRecord::new(id, text).with_metadata(CandidateMetadata {
        upvotes: 0,
        comments: 0,
        authoritative: true,
        source: Some("league recap".to_string()),
    })
}

/// Community posts and recaps without embeddings; the harness embeds them.
pub fn corpus_records() -> Vec<CorpusRecord> {
    vec![
        post(
            "jokic-vision",
            "Jokić is an elite playmaker because his passing vision lets him find cutters nobody else sees",
            1800,
            240,
        ),
        post(
            "jokic-pace",
            "People say Jokić looks slow but he controls the pace of every Nuggets possession",
            650,
            90,
        ),
        recap(
            "lakers-recap",
            "The Lakers won their fifth straight behind a healthy frontcourt and fast break offense",
        ),
        post(
            "lakers-hype",
            "Lakers fans are excited again, the young core makes every game fun to watch",
            2200,
            410,
        ),
        post(
            "curry-gravity",
            "Curry's shooting gravity bends defenses and opens the floor for everyone else",
            3100,
            520,
        ),
        recap(
            "scoring-race",
            "Luka Dončić leads the league in points per game while Shai Gilgeous-Alexander sits second",
        ),
        post(
            "arena",
            "Arena renovation schedule announced, parking lots close for the summer",
            12,
            3,
        ),
    ]
}

pub fn scoring_rows() -> StructuredRows {
    StructuredRows {
        query: Some(
            "SELECT player_name, pts FROM player_season_stats ORDER BY pts DESC LIMIT 3".to_string(),
        ),
        columns: vec!["player_name".to_string(), "pts".to_string()],
        rows: vec![
            vec![serde_json::json!("Luka Dončić"), serde_json::json!(2370)],
            vec![
                serde_json::json!("Shai Gilgeous-Alexander"),
                serde_json::json!(2254),
            ],
            vec![serde_json::json!("Nikola Jokić"), serde_json::json!(2085)],
        ],
    }
}

pub fn jokic_rows() -> StructuredRows {
    StructuredRows {
        query: None,
        columns: vec!["player_name".to_string(), "ast".to_string()],
        rows: vec![vec![serde_json::json!("Nikola Jokić"), serde_json::json!(10.2)]],
    }
}

/// Writes `records` as JSONL to a temp file.
pub fn corpus_file(records: &[CorpusRecord]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    for record in records {
        let line = serde_json::to_string(record).expect("record serializes");
        writeln!(file, "{line}").expect("write record");
    }
    file.flush().expect("flush corpus");
    file
}
