use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use stakecast_models::history::EpochObservation;

use crate::error::SimError;

/// Read observations from a JSON Lines file. Blank lines are skipped.
pub fn load_history(path: impl AsRef<Path>) -> Result<Vec<EpochObservation>, SimError> {
    let file = File::open(path)?;
    parse_history(BufReader::new(file))
}

pub fn parse_history(reader: impl BufRead) -> Result<Vec<EpochObservation>, SimError> {
    let mut observations = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let obs = serde_json::from_str(trimmed).map_err(|source| SimError::Parse {
            line: idx + 1,
            source,
        })?;
        observations.push(obs);
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_skips_blanks() {
        let raw = "\
{\"epoch\": 1, \"prob_up\": 0.6, \"prob_down\": 0.3, \"true_up_close\": true}

{\"epoch\": 2, \"prob_up\": 0.4, \"prob_down\": 0.7, \"true_up_close\": false}
";
        let obs = parse_history(raw.as_bytes()).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[1].epoch, 2);
        assert!(!obs[1].true_up_close);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let raw = "\
{\"epoch\": 1, \"prob_up\": 0.6, \"prob_down\": 0.3, \"true_up_close\": true}
{\"epoch\": 2, \"prob_up\": 0.4}
";
        match parse_history(raw.as_bytes()) {
            Err(SimError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_history("/nonexistent/history.jsonl"),
            Err(SimError::Io(_))
        ));
    }
}
