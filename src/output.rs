//! Result rendering and persistence.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::worker::VanityResult;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to write results: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode results: {0}")]
    Json(#[from] serde_json::Error),
}

/// One result as exposed in JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Record<'a> {
    address: &'a str,
    private_key: String,
}

impl<'a> From<&'a VanityResult> for Record<'a> {
    fn from(result: &'a VanityResult) -> Self {
        Self {
            address: &result.address,
            private_key: format!("0x{}", result.private_key),
        }
    }
}

/// Writes one block per result:
///
/// ```text
/// #1
/// Address:     0x...
/// Private Key: 0x...
/// ```
///
/// followed by a blank line.
pub fn write_text<W: Write>(mut writer: W, results: &[VanityResult]) -> io::Result<()> {
    for (i, result) in results.iter().enumerate() {
        writeln!(writer, "#{}", i + 1)?;
        writeln!(writer, "Address:     {}", result.address)?;
        writeln!(writer, "Private Key: 0x{}", result.private_key)?;
        writeln!(writer)?;
    }
    writer.flush()
}

/// Pretty JSON array of `{ "address", "privateKey" }` objects.
pub fn to_json(results: &[VanityResult]) -> Result<String, OutputError> {
    let records: Vec<Record<'_>> = results.iter().map(Record::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Saves results as text blocks, replacing any existing file.
pub fn save_to_file(path: &Path, results: &[VanityResult]) -> Result<(), OutputError> {
    let file = File::create(path)?;
    write_text(BufWriter::new(file), results)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> Vec<VanityResult> {
        vec![
            VanityResult {
                private_key: "11".repeat(32),
                address: "0xdead000000000000000000000000000000000001".into(),
                worker_id: 0,
            },
            VanityResult {
                private_key: "22".repeat(32),
                address: "0xdead000000000000000000000000000000000002".into(),
                worker_id: 3,
            },
        ]
    }

    #[test]
    fn test_text_blocks() {
        let mut out = Vec::new();
        write_text(&mut out, &results()).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = format!(
            "#1\nAddress:     0xdead000000000000000000000000000000000001\nPrivate Key: 0x{}\n\n\
             #2\nAddress:     0xdead000000000000000000000000000000000002\nPrivate Key: 0x{}\n\n",
            "11".repeat(32),
            "22".repeat(32),
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_json_records() {
        let json = to_json(&results()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let records = value.as_array().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0]["address"],
            "0xdead000000000000000000000000000000000001"
        );
        assert_eq!(records[1]["privateKey"], format!("0x{}", "22".repeat(32)));
        assert!(records[0].get("worker_id").is_none());
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.txt");
        save_to_file(&path, &results()).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("#1\nAddress:     0xdead"));
        assert_eq!(saved.matches("Private Key: 0x").count(), 2);
    }

    #[test]
    fn test_empty_json() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }
}
