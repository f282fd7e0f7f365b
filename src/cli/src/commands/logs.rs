//! `conduct logs` command.

use clap::Args;

use super::AddressArgs;
use crate::control::{ControlClient, LogEntry};
use crate::output;

#[derive(Args)]
pub struct LogsArgs {
    #[command(flatten)]
    pub address: AddressArgs,

    /// The number of logs to fetch, defaults to 10
    #[arg(short = 'n', long, default_value_t = 10)]
    pub lines: usize,

    /// Display the date of the log
    #[arg(long)]
    pub date: bool,

    /// Convert the date/time of the log to UTC
    #[arg(long)]
    pub utc: bool,

    /// The ID or name of the bundle
    pub bundle: String,
}

pub async fn execute(args: LogsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = ControlClient::new(args.address.config())?;
    let response = client.logs(&args.bundle, args.lines).await?;

    println!("{}", render(&response.data, args.date, args.utc));
    Ok(())
}

fn render(entries: &[LogEntry], date: bool, utc: bool) -> String {
    let mut table = output::new_table(&["TIME", "HOST", "LOG"]);
    for entry in entries {
        table.add_row(vec![
            output::format_timestamp(&entry.timestamp, date, utc),
            entry.host.clone(),
            entry.message.clone(),
        ]);
    }
    table.to_string()
}
