//! `conduct services` command.

use std::collections::BTreeMap;

use clap::Args;

use super::ControlArgs;
use crate::control::{display_id, Bundle};
use crate::output;

#[derive(Args)]
pub struct ServicesArgs {
    #[command(flatten)]
    pub control: ControlArgs,
}

pub async fn execute(args: ServicesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = args.control.client()?;
    let response = client.bundles().await?;

    if args.control.verbose {
        output::print_json(&response.raw);
    }

    println!("{}", render(&response.data, args.control.long_ids));
    Ok(())
}

fn status(bundle: &Bundle) -> &'static str {
    if bundle.running_executions() > 0 {
        "Running"
    } else if !bundle.bundle_executions.is_empty() {
        "Starting"
    } else {
        "Stopped"
    }
}

/// Render the `SERVICE BUNDLE ID BUNDLE NAME STATUS` table, followed by a
/// note listing services claimed by more than one bundle.
fn render(bundles: &[Bundle], long_ids: bool) -> String {
    let mut rows = Vec::new();
    for bundle in bundles {
        for endpoint in bundle.bundle_config.endpoints.values() {
            for service in &endpoint.services {
                rows.push((
                    service.clone(),
                    display_id(&bundle.bundle_id, long_ids),
                    bundle.attributes.bundle_name.clone(),
                    status(bundle),
                ));
            }
        }
    }
    rows.sort();

    let mut owners: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (service, id, _, _) in &rows {
        owners.entry(service.as_str()).or_default().push(id.as_str());
    }

    let mut table = output::new_table(&["SERVICE", "BUNDLE ID", "BUNDLE NAME", "STATUS"]);
    for (service, id, name, status) in &rows {
        table.add_row(vec![service.as_str(), id.as_str(), name.as_str(), *status]);
    }

    let mut text = table.to_string();
    let duplicates: Vec<&str> = owners
        .iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(service, _)| *service)
        .collect();
    if !duplicates.is_empty() {
        text.push_str("\n\nNote that the following services are used by multiple bundles: ");
        text.push_str(&duplicates.join(", "));
    }
    text
}
