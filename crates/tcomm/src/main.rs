mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "tcomm", version, about = "Push-gateway client CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::Layer;

    #[test]
    fn parses_listen_subcommand() {
        let cli = Cli::try_parse_from([
            "tcomm",
            "listen",
            "--serial",
            "G090XX",
            "--cookie",
            "session-id=1",
            "--count",
            "3",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.count, Some(3));
                assert_eq!(args.push_host, tcomm_transport::DEFAULT_PUSH_HOST);
                assert_eq!(args.handshake_timeout, "10s");
                assert!(!args.no_fetch);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_frame_sources() {
        let err = Cli::try_parse_from([
            "tcomm",
            "decode",
            "--hex",
            "00",
            "--file",
            "frame.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn decode_defaults_to_the_full_stack() {
        let cli = Cli::try_parse_from(["tcomm", "--format", "json", "decode", "--hex", "00"])
            .expect("decode args should parse");
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Decode(ref args) if args.layer == Layer::Stack
        ));
    }
}
