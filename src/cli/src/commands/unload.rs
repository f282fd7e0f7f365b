//! `conduct unload` command.

use clap::Args;

use super::ControlArgs;
use crate::output;

#[derive(Args)]
pub struct UnloadArgs {
    #[command(flatten)]
    pub control: ControlArgs,

    /// The ID of the bundle
    pub bundle: String,
}

pub async fn execute(args: UnloadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = args.control.client()?;
    let response = client.unload(&args.bundle).await?;

    if args.control.verbose {
        output::print_json(&response.raw);
    }

    println!("Bundle unload request sent.");
    println!(
        "Print ConductR info with: conduct info{}",
        args.control.cli_parameters()
    );
    Ok(())
}
