use super::invoice_aggregator;
use crate::{
    libs::{config::Config, invoice::InvoiceStatus, messages::Message, view::View},
    msg_info, msg_print, msg_success,
};
use anyhow::Result;
use chrono::Local;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct InvoiceArgs {
    #[command(subcommand)]
    command: InvoiceCommand,
}

#[derive(Debug, Subcommand)]
enum InvoiceCommand {
    /// Bill the given time entries to their client
    Generate {
        #[arg(required = true, num_args = 1..)]
        entry_ids: Vec<i64>,
        /// Invoice number; generated from the configured prefix when omitted
        #[arg(short, long)]
        number: Option<String>,
        /// Show the invoice without writing it
        #[arg(long)]
        dry_run: bool,
    },
    List,
    /// Set the status: draft, generated, sent or paid
    Status { id: i64, status: InvoiceStatus },
    /// Delete an invoice and make its entries billable again
    Delete {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
}

pub fn cmd(args: InvoiceArgs) -> Result<()> {
    let settings = Config::read()?.invoice_settings();
    let aggregator = invoice_aggregator(&settings)?;

    match args.command {
        InvoiceCommand::Generate {
            entry_ids,
            number,
            dry_run,
        } => {
            let summary = aggregator.preview(&entry_ids)?;
            msg_print!(Message::InvoicePreviewHeader(summary.lines.len()), true);
            View::invoice_summary(&summary, &settings.currency)?;

            if dry_run {
                msg_info!(Message::InvoiceTotal(summary.total_minutes, summary.total_amount));
                return Ok(());
            }

            let number = match number {
                Some(number) => number,
                None => {
                    let next = aggregator.list_invoices()?.iter().map(|invoice| invoice.id).max().unwrap_or(0) + 1;
                    settings.invoice_number(Local::now().date_naive(), next)
                }
            };
            let invoice = aggregator.generate_invoice(&entry_ids, &number)?;
            msg_success!(Message::InvoiceGenerated(invoice.invoice_number, invoice.total_amount));
        }
        InvoiceCommand::List => {
            let invoices = aggregator.list_invoices()?;

            if invoices.is_empty() {
                msg_info!(Message::NoInvoicesFound);
                return Ok(());
            }

            msg_print!(Message::InvoicesHeader, true);
            View::invoices(&invoices, &settings.currency)?;
        }
        InvoiceCommand::Status { id, status } => {
            let invoice = aggregator.set_status(id, status)?;
            msg_success!(Message::InvoiceStatusUpdated(invoice.id, invoice.status.to_string()));
        }
        InvoiceCommand::Delete { id, yes } => {
            let confirmed = yes
                || Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(Message::ConfirmDeleteInvoice(id).to_string())
                    .default(false)
                    .interact()?;

            if confirmed {
                aggregator.delete_invoice(id)?;
                msg_success!(Message::InvoiceDeleted(id));
            } else {
                msg_info!(Message::OperationCancelled);
            }
        }
    }
    Ok(())
}
