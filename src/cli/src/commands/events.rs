//! `conduct events` command.

use clap::Args;

use super::AddressArgs;
use crate::control::{ControlClient, EventEntry};
use crate::output;

#[derive(Args)]
pub struct EventsArgs {
    #[command(flatten)]
    pub address: AddressArgs,

    /// The number of events to fetch, defaults to 10
    #[arg(short = 'n', long, default_value_t = 10)]
    pub lines: usize,

    /// Display the date of the events
    #[arg(long)]
    pub date: bool,

    /// Convert the date/time of the events to UTC
    #[arg(long)]
    pub utc: bool,

    /// The ID or name of the bundle
    pub bundle: String,
}

pub async fn execute(args: EventsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = ControlClient::new(args.address.config())?;
    let response = client.events(&args.bundle, args.lines).await?;

    println!("{}", render(&response.data, args.date, args.utc));
    Ok(())
}

fn render(entries: &[EventEntry], date: bool, utc: bool) -> String {
    let mut table = output::new_table(&["TIME", "EVENT", "DESC"]);
    for entry in entries {
        table.add_row(vec![
            output::format_timestamp(&entry.timestamp, date, utc),
            entry.event.clone(),
            entry.description.clone(),
        ]);
    }
    table.to_string()
}
