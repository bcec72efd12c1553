use crate::db::clients::Client;
use crate::db::projects::Project;
use crate::db::tasks::Task;
use crate::libs::entry::TimeEntry;
use crate::libs::invoice::{Invoice, InvoiceSummary};
use crate::libs::messages::format_minutes;
use anyhow::Result;
use prettytable::{row, Table};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct View {}

impl View {
    pub fn entries(entries: &[TimeEntry]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "CLIENT", "PROJECT", "DESCRIPTION", "START", "END", "DURATION", "INVOICE"]);
        for entry in entries {
            table.add_row(row![
                entry.id,
                optional_id(entry.client_id),
                optional_id(entry.project_id),
                entry.description,
                entry.start_time.format(TIME_FORMAT),
                entry
                    .end_time
                    .map(|end| end.format(TIME_FORMAT).to_string())
                    .unwrap_or_else(|| "running".to_string()),
                format_minutes(entry.duration),
                optional_id(entry.invoice_id)
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn clients(clients: &[Client]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "NAME", "RATE"]);
        for client in clients {
            table.add_row(row![client.id, client.name, optional_rate(client.hourly_rate)]);
        }
        table.printstd();

        Ok(())
    }

    pub fn projects(projects: &[Project]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "CLIENT", "NAME", "RATE"]);
        for project in projects {
            table.add_row(row![project.id, project.client_id, project.name, optional_rate(project.hourly_rate)]);
        }
        table.printstd();

        Ok(())
    }

    pub fn tasks(tasks: &[Task]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "PROJECT", "NAME"]);
        for task in tasks {
            table.add_row(row![task.id, task.project_id, task.name]);
        }
        table.printstd();

        Ok(())
    }

    pub fn invoices(invoices: &[Invoice], currency: &str) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "NUMBER", "CLIENT", "TOTAL", "STATUS", "PERIOD", "DUE"]);
        for invoice in invoices {
            table.add_row(row![
                invoice.id,
                invoice.invoice_number,
                invoice.client_id,
                format!("{} {}", invoice.total_amount, currency),
                invoice.status,
                format!("{} - {}", invoice.period_start, invoice.period_end),
                invoice.due_date
            ]);
        }
        table.printstd();

        Ok(())
    }

    /// Line items of an invoice, before or after it is written.
    pub fn invoice_summary(summary: &InvoiceSummary, currency: &str) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ENTRY", "DESCRIPTION", "TIME", "RATE", "AMOUNT"]);
        for line in &summary.lines {
            table.add_row(row![
                line.entry_id,
                line.description,
                format_minutes(line.minutes),
                line.hourly_rate,
                line.amount.round_dp(2)
            ]);
        }
        table.add_row(row![
            "",
            "TOTAL",
            format_minutes(summary.total_minutes),
            "",
            format!("{} {}", summary.total_amount, currency)
        ]);
        table.printstd();

        Ok(())
    }
}

fn optional_id(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

fn optional_rate(rate: Option<rust_decimal::Decimal>) -> String {
    rate.map(|rate| rate.to_string()).unwrap_or_else(|| "-".to_string())
}
