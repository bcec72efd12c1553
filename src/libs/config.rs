//! Application settings stored as `config.json` in the data directory.
//!
//! Every section is optional; a missing section means built-in defaults.
//!
//! ```rust,no_run
//! use billable::libs::config::Config;
//!
//! let config = Config::read()?;
//! let timer = config.timer_settings();
//! println!("rounding to {} minutes", timer.rounding_minutes);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::invoice::DEFAULT_PAYMENT_TERMS_DAYS;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// A section offered by the setup wizard.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Timer behaviour.
///
/// The two windows are independent: rounding applies to every billed
/// stop, the grace window only decides whether `start` resumes the last
/// entry instead of opening a new one.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct TimerConfig {
    /// Round stopped durations up to a multiple of this. `0` disables.
    pub rounding_minutes: i64,
    pub resume_grace_minutes: i64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            rounding_minutes: 0,
            resume_grace_minutes: 15,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct InvoiceConfig {
    pub number_prefix: String,
    pub payment_terms_days: i64,
    pub currency: String,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        InvoiceConfig {
            number_prefix: "INV-".to_string(),
            payment_terms_days: DEFAULT_PAYMENT_TERMS_DAYS,
            currency: "USD".to_string(),
        }
    }
}

impl InvoiceConfig {
    /// `INV-20261016-0042` for invoice sequence 42 issued on that day.
    pub fn invoice_number(&self, date: chrono::NaiveDate, sequence: i64) -> String {
        format!("{}{}-{:04}", self.number_prefix, date.format("%Y%m%d"), sequence)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceConfig>,
}

impl Config {
    /// Reads the default config file, or defaults when there is none.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        Self::read_from(&config_file_path)
    }

    pub fn read_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        self.save_to(&config_file_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let config_file = File::create(path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    pub fn timer_settings(&self) -> TimerConfig {
        self.timer.clone().unwrap_or_default()
    }

    pub fn invoice_settings(&self) -> InvoiceConfig {
        self.invoice.clone().unwrap_or_default()
    }

    /// Interactive setup, starting from the saved values.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![
            ConfigModule {
                key: "timer".to_string(),
                name: Message::ConfigModuleTimer.to_string(),
            },
            ConfigModule {
                key: "invoice".to_string(),
                name: Message::ConfigModuleInvoice.to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::SelectConfigModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "timer" => {
                    let default = config.timer_settings();
                    msg_print!(Message::ConfigModuleTimer);
                    config.timer = Some(TimerConfig {
                        rounding_minutes: prompt_non_negative(Message::PromptRoundingMinutes, default.rounding_minutes)?,
                        resume_grace_minutes: prompt_non_negative(Message::PromptResumeGraceMinutes, default.resume_grace_minutes)?,
                    });
                }
                "invoice" => {
                    let default = config.invoice_settings();
                    msg_print!(Message::ConfigModuleInvoice);
                    config.invoice = Some(InvoiceConfig {
                        number_prefix: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptInvoicePrefix.to_string())
                            .default(default.number_prefix)
                            .interact_text()?,
                        payment_terms_days: prompt_non_negative(Message::PromptPaymentTermsDays, default.payment_terms_days)?,
                        currency: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptCurrency.to_string())
                            .default(default.currency)
                            .interact_text()?,
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}

fn prompt_non_negative(prompt: Message, default: i64) -> Result<i64> {
    let value = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt.to_string())
        .default(default)
        .validate_with(|input: &i64| -> Result<(), String> {
            if *input >= 0 {
                Ok(())
            } else {
                Err(Message::InvalidNonNegative.to_string())
            }
        })
        .interact_text()?;
    Ok(value)
}
