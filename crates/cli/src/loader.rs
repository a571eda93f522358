//! Backlog CSV loading.
//!
//! Columns are matched by header name; extra columns are ignored. Every
//! field is trimmed. Any malformed row aborts the load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use backlog::{StoryPoints, WorkItemRecord};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BacklogRow {
    #[serde(rename = "Epic ID")]
    epic_id: String,
    #[serde(rename = "PBI ID")]
    pbi_id: String,
    #[serde(rename = "PBI Title")]
    title: String,
    #[serde(rename = "Story Points")]
    story_points: u32,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Sprint")]
    sprint: String,
}

/// Reads every row of the CSV file at `path`.
pub fn load_records(path: &Path) -> Result<Vec<WorkItemRecord>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    read_records(file).with_context(|| format!("cannot load {}", path.display()))
}

/// Reads work items from CSV text with a header row.
pub fn read_records<R: Read>(input: R) -> Result<Vec<WorkItemRecord>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);
    let headers = reader.headers().context("missing header row")?.clone();

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    loop {
        let more = reader
            .read_record(&mut row)
            .map_err(|e| anyhow!("malformed row: {e}"))?;
        if !more {
            break;
        }
        let line = row.position().map_or(0, csv::Position::line);
        let parsed: BacklogRow = row
            .deserialize(Some(&headers))
            .map_err(|e| anyhow!("line {line}: {e}"))?;
        records.push(WorkItemRecord {
            epic_key: parsed.epic_id,
            item_id: parsed.pbi_id,
            title: parsed.title,
            story_points: StoryPoints::new(parsed.story_points),
            description: parsed.description,
            sprint_key: parsed.sprint,
            source_line: line,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Epic ID,PBI ID,PBI Title,Story Points,Description,Sprint\n";

    #[test]
    fn reads_rows_in_order_with_line_numbers() {
        let input = format!(
            "{HEADER}Epic 1,PBI-1.1,Catalog schema,5,Define tables,Sprint 1-2\n\
             Epic 2, PBI-2.1 , Cart ,8,\"Totals, taxes\",Sprint 7\n"
        );

        let records = read_records(input.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].item_id, "PBI-1.1");
        assert_eq!(records[0].source_line, 2);
        assert_eq!(records[1].item_id, "PBI-2.1");
        assert_eq!(records[1].title, "Cart");
        assert_eq!(records[1].description, "Totals, taxes");
        assert_eq!(records[1].story_points, StoryPoints::new(8));
        assert_eq!(records[1].source_line, 3);
    }

    #[test]
    fn extra_columns_and_column_order_do_not_matter() {
        let input = "Sprint,Notes,Story Points,PBI Title,PBI ID,Epic ID,Description\n\
                     Sprint 3,ignored,2,Prices,PBI-3.1,Epic 3,Money\n";

        let records = read_records(input.as_bytes()).unwrap();

        assert_eq!(records[0].epic_key, "Epic 3");
        assert_eq!(records[0].sprint_key, "Sprint 3");
    }

    #[test]
    fn non_integer_story_points_name_the_line() {
        let input = format!("{HEADER}Epic 1,PBI-1.1,A,3,d,Sprint 1-2\nEpic 1,PBI-1.2,B,big,d,Sprint 1-2\n");

        let err = read_records(input.as_bytes()).unwrap_err();

        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn missing_column_is_fatal() {
        let input = "Epic ID,PBI ID,PBI Title,Description,Sprint\nEpic 1,PBI-1.1,A,d,Sprint 1-2\n";

        assert!(read_records(input.as_bytes()).is_err());
    }

    #[test]
    fn header_only_file_is_empty() {
        assert!(read_records(HEADER.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{HEADER}Epic 4,PBI-4.1,Shell,13,Layout,Sprint 11\n").unwrap();

        let records = load_records(file.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].story_points.as_u32(), 13);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(&dir.path().join("absent.csv")).unwrap_err();
        assert!(err.to_string().contains("cannot open"));
    }
}
