//! `conduct info` command: list bundles and their replication state.

use clap::Args;

use super::ControlArgs;
use crate::control::{display_id, Bundle};
use crate::output;

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub control: ControlArgs,
}

pub async fn execute(args: InfoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = args.control.client()?;
    let response = client.bundles().await?;

    if args.control.verbose {
        output::print_json(&response.raw);
    }

    println!("{}", render(&response.data, args.control.long_ids));
    Ok(())
}

/// Render the `ID NAME #REP #STR #RUN` table.
fn render(bundles: &[Bundle], long_ids: bool) -> String {
    let mut table = output::new_table(&["ID", "NAME", "#REP", "#STR", "#RUN"]);
    for bundle in bundles {
        table.add_row(vec![
            display_id(&bundle.bundle_id, long_ids),
            bundle.attributes.bundle_name.clone(),
            bundle.bundle_installations.len().to_string(),
            bundle.starting_executions().to_string(),
            bundle.running_executions().to_string(),
        ]);
    }
    table.to_string()
}
