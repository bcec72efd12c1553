use billable::commands::Cli;
use billable::libs::{logging::init_logging, messages::Message};
use billable::msg_error;

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = Cli::menu().await {
        msg_error!(Message::CommandFailed(format!("{:#}", e)));
        std::process::exit(1);
    }
}
