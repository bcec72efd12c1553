pub mod display;
pub mod macros;
pub mod types;

pub use display::format_minutes;
pub use types::Message;
