#[cfg(test)]
mod tests {
    use billable::libs::entry::TimeEntry;
    use billable::libs::export::{ExportFormat, Exporter};
    use billable::libs::invoice::{Invoice, InvoiceStatus};
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn entries() -> Vec<TimeEntry> {
        vec![
            TimeEntry {
                id: 1,
                client_id: Some(3),
                project_id: None,
                task_id: None,
                description: "Backend, API".to_string(),
                start_time: at(2, 9, 0),
                end_time: Some(at(2, 10, 30)),
                duration: 90,
                is_active: false,
                is_invoiced: true,
                invoice_id: Some(4),
            },
            TimeEntry {
                id: 2,
                client_id: None,
                project_id: None,
                task_id: None,
                description: "Running".to_string(),
                start_time: at(3, 14, 0),
                end_time: None,
                duration: 0,
                is_active: true,
                is_invoiced: false,
                invoice_id: None,
            },
        ]
    }

    fn invoice() -> Invoice {
        Invoice {
            id: 4,
            invoice_number: "INV-20260331-0001".to_string(),
            client_id: 3,
            total_amount: Decimal::from_str("72.50").unwrap(),
            status: InvoiceStatus::Sent,
            period_start: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 4, 30).unwrap(),
            created_at: at(31, 17, 0),
        }
    }

    #[tokio::test]
    async fn test_entries_to_csv() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(ExportFormat::Csv, Some(dir.path().join("entries.csv")));

        let path = exporter.export_entries(&entries()).await.unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,client_id,project_id,task_id,description,start_time,end_time,duration_minutes"));
        assert!(lines[1].contains("\"Backend, API\""));
        assert!(lines[1].contains("2026-03-02 10:30:00"));
        assert!(lines[2].contains(",true,false,"));
    }

    #[tokio::test]
    async fn test_entries_to_json() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(ExportFormat::Json, Some(dir.path().join("entries.json")));

        let path = exporter.export_entries(&entries()).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["duration_minutes"], 90);
        assert_eq!(rows[0]["invoice_id"], 4);
        assert!(rows[1]["end_time"].is_null());
    }

    #[tokio::test]
    async fn test_invoices_keep_exact_amounts() {
        let dir = TempDir::new().unwrap();
        let csv_exporter = Exporter::new(ExportFormat::Csv, Some(dir.path().join("invoices.csv")));
        let json_exporter = Exporter::new(ExportFormat::Json, Some(dir.path().join("invoices.json")));

        let csv = std::fs::read_to_string(csv_exporter.export_invoices(&[invoice()]).await.unwrap()).unwrap();
        let json = std::fs::read_to_string(json_exporter.export_invoices(&[invoice()]).await.unwrap()).unwrap();

        assert!(csv.contains("INV-20260331-0001,3,72.50,sent,2026-03-02,2026-03-02,2026-04-30"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["total_amount"], "72.50");
        assert_eq!(value[0]["status"], "sent");
    }

    #[test]
    fn test_default_file_name() {
        let exporter = Exporter::new(ExportFormat::Json, None);
        let name = exporter.output_path().to_string_lossy().to_string();

        assert!(name.starts_with("billable_export_"));
        assert!(name.ends_with(".json"));
    }
}
