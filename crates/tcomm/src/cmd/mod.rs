use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod channels;
pub mod decode;
pub mod listen;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to the push gateway and print session events.
    Listen(ListenArgs),
    /// Decode a captured frame offline.
    Decode(DecodeArgs),
    /// Print the named-channel table.
    Channels,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Channels => channels::run(format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial number presented to the gateway.
    #[arg(long, env = "TCOMM_SERIAL")]
    pub serial: String,
    /// Account session cookie.
    #[arg(long, env = "TCOMM_COOKIE", hide_env_values = true)]
    pub cookie: String,
    /// Push gateway host.
    #[arg(long, env = "TCOMM_PUSH_HOST", default_value = tcomm_transport::DEFAULT_PUSH_HOST)]
    pub push_host: String,
    /// Origin header sent with the upgrade request.
    #[arg(long, default_value = tcomm_transport::DEFAULT_ORIGIN)]
    pub origin: String,
    /// Host serving the activity and notification APIs.
    #[arg(long, env = "TCOMM_AJAX_HOST", default_value = tcomm_fetch::DEFAULT_AJAX_HOST)]
    pub ajax_host: String,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Time allowed for the handshake (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s")]
    pub handshake_timeout: String,
    /// Do not resolve activity or notification pushes over HTTP.
    #[arg(long)]
    pub no_fetch: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Layer {
    Tuning,
    Transport,
    Gateway,
    /// Transport, then gateway, then the JSON command.
    Stack,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Protocol layer the frame belongs to.
    #[arg(long, value_enum, default_value = "stack")]
    pub layer: Layer,
    /// Frame bytes as hex.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,
    /// Read the raw frame from a file.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
