//! `conduct load` command.

use std::path::PathBuf;

use clap::Args;

use super::ControlArgs;
use crate::control::display_id;
use crate::output;

#[derive(Args)]
pub struct LoadArgs {
    #[command(flatten)]
    pub control: ControlArgs,

    /// The path to the bundle
    pub bundle: PathBuf,

    /// The optional configuration for the bundle
    pub configuration: Option<PathBuf>,
}

pub async fn execute(args: LoadArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.bundle.is_file() {
        return Err(format!("Bundle not found: {}", args.bundle.display()).into());
    }
    if let Some(configuration) = &args.configuration {
        if !configuration.is_file() {
            return Err(format!("Configuration not found: {}", configuration.display()).into());
        }
    }

    println!("Loading bundle to ConductR..");
    let client = args.control.client()?;
    let response = client
        .load(&args.bundle, args.configuration.as_deref())
        .await?;

    if args.control.verbose {
        output::print_json(&response.raw);
    }

    println!(
        "{}",
        loaded_message(
            &response.data.bundle_id,
            args.control.long_ids,
            &args.control.cli_parameters()
        )
    );
    Ok(())
}

fn loaded_message(bundle_id: &str, long_ids: bool, cli_parameters: &str) -> String {
    let id = display_id(bundle_id, long_ids);
    format!(
        "Bundle loaded.\nStart bundle with: conduct run{cli_parameters} {id}\n\
         Unload bundle with: conduct unload{cli_parameters} {id}\n\
         Print ConductR info with: conduct info{cli_parameters}"
    )
}
