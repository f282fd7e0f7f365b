//! `conduct run` command.

use clap::Args;

use super::ControlArgs;
use crate::control::display_id;
use crate::output;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub control: ControlArgs,

    /// The optional number of executions, defaults to 1
    #[arg(long, default_value_t = 1)]
    pub scale: u32,

    /// The ID of the bundle
    pub bundle: String,
}

pub async fn execute(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = args.control.client()?;
    let response = client.scale(&args.bundle, args.scale).await?;

    if args.control.verbose {
        output::print_json(&response.raw);
    }

    println!(
        "{}",
        started_message(
            bundle_id(&response.data.bundle_id, &args.bundle),
            args.control.long_ids,
            &args.control.cli_parameters()
        )
    );
    Ok(())
}

/// The id echoed by the control API, or the requested one when the reply
/// carried none.
fn bundle_id<'a>(replied: &'a str, requested: &'a str) -> &'a str {
    if replied.is_empty() {
        requested
    } else {
        replied
    }
}

fn started_message(bundle_id: &str, long_ids: bool, cli_parameters: &str) -> String {
    let id = display_id(bundle_id, long_ids);
    format!(
        "Bundle run request sent.\nStop bundle with: conduct stop{cli_parameters} {id}\n\
         Print ConductR info with: conduct info{cli_parameters}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_message() {
        assert_eq!(
            started_message("1234567890", true, ""),
            "Bundle run request sent.\n\
             Stop bundle with: conduct stop 1234567890\n\
             Print ConductR info with: conduct info"
        );
    }

    #[test]
    fn test_hint_falls_back_to_requested_bundle() {
        assert_eq!(bundle_id("", "visualizer"), "visualizer");
        assert_eq!(bundle_id("45e0c477", "visualizer"), "45e0c477");

        let text = started_message(bundle_id("", "visualizer"), true, "");
        assert!(text.contains("conduct stop visualizer\n"));
    }
}
