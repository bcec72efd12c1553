use super::{invoice_aggregator, timer_engine};
use crate::{
    libs::{
        config::Config,
        entry::EntryFilter,
        export::{ExportData, ExportFormat, Exporter},
        messages::Message,
    },
    msg_info, msg_success,
};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(value_enum)]
    data: ExportData,

    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,

    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn cmd(args: ExportArgs) -> Result<()> {
    let exporter = Exporter::new(args.format, args.output);

    let path = match args.data {
        ExportData::Entries => {
            let entries = timer_engine()?.list_entries(&EntryFilter::default())?;
            if entries.is_empty() {
                msg_info!(Message::ExportNoData);
                return Ok(());
            }
            exporter.export_entries(&entries).await?
        }
        ExportData::Invoices => {
            let settings = Config::read()?.invoice_settings();
            let invoices = invoice_aggregator(&settings)?.list_invoices()?;
            if invoices.is_empty() {
                msg_info!(Message::ExportNoData);
                return Ok(());
            }
            exporter.export_invoices(&invoices).await?
        }
    };

    msg_success!(Message::ExportCompleted(path.display().to_string()));
    Ok(())
}
