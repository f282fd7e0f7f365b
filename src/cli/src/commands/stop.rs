//! `conduct stop` command.

use clap::Args;

use super::ControlArgs;
use crate::output;

#[derive(Args)]
pub struct StopArgs {
    #[command(flatten)]
    pub control: ControlArgs,

    /// The ID of the bundle
    pub bundle: String,
}

pub async fn execute(args: StopArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = args.control.client()?;
    let response = client.scale(&args.bundle, 0).await?;

    if args.control.verbose {
        output::print_json(&response.raw);
    }

    println!("Bundle stop request sent.");
    println!(
        "Unload bundle with: conduct unload{} {}",
        args.control.cli_parameters(),
        args.bundle
    );
    println!(
        "Print ConductR info with: conduct info{}",
        args.control.cli_parameters()
    );
    Ok(())
}
