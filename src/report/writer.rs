//! Semicolon-delimited CSV serialization of the final report.
//!
//! One row per top-level ticket, in original query order. The header
//! row is derived from the row struct's field names.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::{TimeBucket, Ticket};

/// One output row.
///
/// Time columns are HH:MM text on purpose: spreadsheet tools
/// reinterpret numeric-looking durations.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "State")]
    state: &'a str,
    #[serde(rename = "Type")]
    work_item_type: &'a str,
    #[serde(rename = "Priority")]
    priority: &'a str,
    #[serde(rename = "EstimatedDevTime")]
    estimated_dev: &'a str,
    #[serde(rename = "EstimatedTestTime")]
    estimated_test: &'a str,
    #[serde(rename = "TempsTotal")]
    temps_total: String,
    #[serde(rename = "TempsDev")]
    temps_dev: String,
    #[serde(rename = "TempsTest")]
    temps_test: String,
    #[serde(rename = "AutresActivités")]
    autres_activites: String,
}

/// Whole seconds to zero-padded HH:MM.
///
/// Hours are not capped at 24 and grow past two digits when needed;
/// the seconds remainder is discarded.
pub fn format_hhmm(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
}

/// Timestamp-derived output name, unique per run.
pub fn export_filename(now: DateTime<Local>) -> String {
    format!("export_{}.csv", now.format("%Y%m%d%H%M%S"))
}

/// Serialize every ticket, in query order, with its time columns
/// attached from the aggregated buckets.
pub fn write_report(
    path: &Path,
    tickets: &[Ticket],
    buckets: &HashMap<String, TimeBucket>,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for ticket in tickets {
        let bucket = buckets.get(&ticket.id).copied().unwrap_or_default();
        writer
            .serialize(ReportRow {
                id: &ticket.id,
                title: &ticket.title,
                state: &ticket.state,
                work_item_type: &ticket.work_item_type,
                priority: &ticket.priority,
                estimated_dev: &ticket.estimated_dev,
                estimated_test: &ticket.estimated_test,
                temps_total: format_hhmm(bucket.total),
                temps_dev: format_hhmm(bucket.dev),
                temps_test: format_hhmm(bucket.test),
                autres_activites: format_hhmm(bucket.other),
            })
            .with_context(|| format!("Failed to write row for work item {}", ticket.id))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ticket(id: &str, title: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: title.to_string(),
            state: "Active".to_string(),
            work_item_type: "User Story".to_string(),
            priority: "2".to_string(),
            estimated_dev: "5".to_string(),
            estimated_test: "3".to_string(),
        }
    }

    #[test]
    fn test_format_hhmm() {
        assert_eq!(format_hhmm(0), "00:00");
        assert_eq!(format_hhmm(59), "00:00");
        assert_eq!(format_hhmm(60), "00:01");
        assert_eq!(format_hhmm(3725), "01:02");
        // Hours are uncapped.
        assert_eq!(format_hhmm(90000), "25:00");
    }

    #[test]
    fn test_export_filename() {
        let now = Local.with_ymd_and_hms(2024, 3, 7, 14, 30, 5).unwrap();
        assert_eq!(export_filename(now), "export_20240307143005.csv");
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");

        let tickets = vec![ticket("101", "Login page"), ticket("102", "Search")];
        let mut buckets = HashMap::new();
        buckets.insert(
            "101".to_string(),
            TimeBucket {
                total: 5400,
                dev: 3600,
                test: 1800,
                other: 0,
            },
        );
        buckets.insert(
            "102".to_string(),
            TimeBucket {
                total: 900,
                dev: 0,
                test: 0,
                other: 900,
            },
        );

        write_report(&path, &tickets, &buckets).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "ID;Title;State;Type;Priority;EstimatedDevTime;EstimatedTestTime;\
             TempsTotal;TempsDev;TempsTest;AutresActivités"
        );
        assert_eq!(
            lines[1],
            "101;Login page;Active;User Story;2;5;3;01:30;01:00;00:30;00:00"
        );
        assert_eq!(lines[2], "102;Search;Active;User Story;2;5;3;00:15;00:00;00:00;00:15");
    }

    #[test]
    fn test_write_report_missing_bucket_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");

        let tickets = vec![ticket("103", "No time logged")];
        write_report(&path, &tickets, &HashMap::new()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("103;No time logged;Active;User Story;2;5;3;00:00;00:00;00:00;00:00"));
    }

    #[test]
    fn test_write_report_preserves_query_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");

        let tickets = vec![
            ticket("300", "Third"),
            ticket("100", "First"),
            ticket("200", "Second"),
        ];
        write_report(&path, &tickets, &HashMap::new()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let ids: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|line| line.split(';').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["300", "100", "200"]);
    }
}
