//! `conduct version` command.

use clap::Args;
use conduct_core::config::supported_api_versions;

#[derive(Args)]
pub struct VersionArgs;

pub async fn execute(_args: VersionArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", version_text());
    Ok(())
}

fn version_text() -> String {
    format!(
        "conduct version {}\nsupported ConductR API versions: {}",
        conduct_core::VERSION,
        supported_api_versions().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_text() {
        let text = version_text();
        assert!(text.starts_with(&format!("conduct version {}", conduct_core::VERSION)));
        assert!(text.ends_with("1.0, 2.0"));
    }
}
