//! CLI command definitions and dispatch.

mod bndl;
mod events;
mod info;
mod load;
mod logs;
mod run;
mod services;
mod stop;
mod unload;
mod version;

use clap::{Args, Parser, Subcommand};
use conduct_core::config::{
    supported_api_versions, ControlConfig, API_VERSION_ENV, DEFAULT_API_VERSION, DEFAULT_IP,
    DEFAULT_PORT, IP_ENV, PORT_ENV,
};

use crate::control::ControlClient;

/// Conduct: command-line client for the ConductR control API.
#[derive(Parser)]
#[command(name = "conduct", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Print version
    Version(version::VersionArgs),
    /// Print bundle information
    Info(info::InfoArgs),
    /// Print service information
    Services(services::ServicesArgs),
    /// Load a bundle
    Load(load::LoadArgs),
    /// Run a bundle
    Run(run::RunArgs),
    /// Stop a bundle
    Stop(stop::StopArgs),
    /// Unload a bundle
    Unload(unload::UnloadArgs),
    /// Show bundle events
    Events(events::EventsArgs),
    /// Show bundle logs
    Logs(logs::LogsArgs),
    /// Create a bundle from an OCI image layout
    Bndl(bndl::BndlArgs),
}

/// Address of a control-plane member.
#[derive(Args, Debug, Clone)]
pub struct AddressArgs {
    /// The optional ConductR IP, defaults to $CONDUCTR_IP or "127.0.0.1"
    #[arg(short, long, env = IP_ENV, default_value = DEFAULT_IP)]
    pub ip: String,

    /// The optional ConductR port, defaults to $CONDUCTR_PORT or 9005
    #[arg(short, long, env = PORT_ENV, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl AddressArgs {
    /// Connection settings with the API version taken from the environment.
    pub fn config(&self) -> ControlConfig {
        ControlConfig::new(self.ip.clone(), self.port, ControlConfig::default().api_version)
    }
}

/// Options shared by the bundle management commands.
#[derive(Args, Debug, Clone)]
pub struct ControlArgs {
    #[command(flatten)]
    pub address: AddressArgs,

    /// Sets which ConductR api version to be used
    #[arg(
        long,
        env = API_VERSION_ENV,
        default_value = DEFAULT_API_VERSION,
        value_parser = clap::builder::PossibleValuesParser::new(supported_api_versions().iter().copied())
    )]
    pub api_version: String,

    /// Print JSON response to the command
    #[arg(short, long)]
    pub verbose: bool,

    /// Print long Bundle IDs
    #[arg(long)]
    pub long_ids: bool,
}

impl ControlArgs {
    pub fn config(&self) -> ControlConfig {
        ControlConfig::new(self.address.ip.clone(), self.address.port, self.api_version.clone())
    }

    pub fn client(&self) -> Result<ControlClient, Box<dyn std::error::Error>> {
        Ok(ControlClient::new(self.config())?)
    }

    /// Flags to repeat in follow-up command hints.
    pub fn cli_parameters(&self) -> String {
        self.config().cli_parameters()
    }
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Version(args) => version::execute(args).await,
        Command::Info(args) => info::execute(args).await,
        Command::Services(args) => services::execute(args).await,
        Command::Load(args) => load::execute(args).await,
        Command::Run(args) => run::execute(args).await,
        Command::Stop(args) => stop::execute(args).await,
        Command::Unload(args) => unload::execute(args).await,
        Command::Events(args) => events::execute(args).await,
        Command::Logs(args) => logs::execute(args).await,
        Command::Bndl(args) => bndl::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_options() {
        let cli = Cli::try_parse_from([
            "conduct", "run", "--scale", "3", "-i", "10.0.0.1", "-p", "9999", "--long-ids", "abc",
        ])
        .unwrap();

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.scale, 3);
                assert_eq!(args.bundle, "abc");
                assert_eq!(args.control.address.ip, "10.0.0.1");
                assert_eq!(args.control.address.port, 9999);
                assert!(args.control.long_ids);
                assert_eq!(args.control.cli_parameters(), " --ip 10.0.0.1 --port 9999");
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_api_version() {
        let result = Cli::try_parse_from(["conduct", "info", "--api-version", "9.9"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_load_with_configuration() {
        let cli = Cli::try_parse_from(["conduct", "load", "b.zip", "c.zip", "-v"]).unwrap();
        match cli.command {
            Command::Load(args) => {
                assert_eq!(args.bundle.to_str(), Some("b.zip"));
                assert_eq!(args.configuration.as_deref().and_then(|p| p.to_str()), Some("c.zip"));
                assert!(args.control.verbose);
            }
            _ => panic!("expected load"),
        }
    }

    #[test]
    fn test_parse_logs_defaults() {
        let cli = Cli::try_parse_from(["conduct", "logs", "visualizer"]).unwrap();
        match cli.command {
            Command::Logs(args) => {
                assert_eq!(args.lines, 10);
                assert!(!args.date);
                assert!(!args.utc);
                assert_eq!(args.bundle, "visualizer");
            }
            _ => panic!("expected logs"),
        }
    }

    #[test]
    fn test_logs_has_no_verbose_flag() {
        assert!(Cli::try_parse_from(["conduct", "logs", "-v", "visualizer"]).is_err());
    }
}
