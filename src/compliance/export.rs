//! Activity Export
//!
//! 処理記録の CSV 出力

use super::types::{ActivityRecord, TIMESTAMP_FORMAT};

/// CSV ヘッダー
pub const CSV_HEADER: &str = "id,user_id,activity_type,timestamp,is_consent_given,retention_period";

/// 処理記録を CSV テキストに変換
pub fn activities_to_csv(records: &[ActivityRecord]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for record in records {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            escape(&record.id),
            escape(&record.user_id),
            escape(&record.activity_type),
            record.timestamp.format(TIMESTAMP_FORMAT),
            record.consent_given,
            record.retention_until.format(TIMESTAMP_FORMAT),
        ));
    }

    csv
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::types::RetentionWindow;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_activities_to_csv() {
        let timestamp = Utc.with_ymd_and_hms(2025, 4, 8, 12, 30, 0).unwrap();
        let record = ActivityRecord::at(
            "user123",
            "authentication",
            json!({"username": "jdoe"}),
            true,
            RetentionWindow::default(),
            timestamp,
        );

        let csv = activities_to_csv(&[record.clone()]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            format!(
                "{},user123,authentication,2025-04-08 12:30:00,true,2027-04-08 12:30:00",
                record.id
            )
        );
    }

    #[test]
    fn test_empty_export_has_header_only() {
        assert_eq!(activities_to_csv(&[]), format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
