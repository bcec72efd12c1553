pub mod clock;
pub mod config;
pub mod data_storage;
pub mod entry;
pub mod error;
pub mod event;
pub mod export;
pub mod invoice;
pub mod logging;
pub mod messages;
pub mod rounding;
pub mod timer;
pub mod view;
