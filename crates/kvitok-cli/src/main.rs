mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use kvitok_client::ClientError;
use kvitok_client::config::LOG_ENV;
use stdout_io::write_stdout_text;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn";

const TOP_LEVEL_HELP: &str = "kvitok - fiscal receipt ledger

USAGE: kvitok <command>

First run:
  1. kvitok user register <email> --password-hash <hash>    Create a user, note the usr_ id
  2. kvitok ingest --help                                    Read the accepted receipt formats
  3. kvitok ingest <path> --user <user-id>                   Store receipts (safe to repeat)

Look at your spending:
  kvitok receipt list --user <user-id>
  kvitok analytics total --user <user-id>
  kvitok analytics monthly --user <user-id> --year 2026
  kvitok analytics top-products --user <user-id> --months-back 3
  kvitok analytics by-shop --user <user-id> --sort-by receipts_count --desc

Teach kvitok your shops:
  kvitok shop list --user <user-id>
  kvitok pattern add <shop-id> <text> --user <user-id>      Route trade names to a shop
  kvitok shop resolve <trade-name> --user <user-id>          Check which shop a name maps to

Every command accepts --json. Set KVITOK_LOG=debug to trace shop matching on stderr.
";

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 || is_top_level_help_request(&raw_args) {
        if write_stdout_text(TOP_LEVEL_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cli = match cli::Cli::try_parse() {
        Ok(value) => value,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                if write_stdout_text(&err.to_string()).is_err() {
                    return Err(ExitCode::from(2));
                }
                return Ok(ExitCode::SUCCESS);
            }

            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error = ClientError::invalid_argument_for_command(
                &clean_message,
                command_path_from_args(&raw_args).as_deref(),
            );
            let mode = infer_requested_output_mode(&raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            return Err(ExitCode::from(1));
        }
    };
    let mode = output::mode_for_command(&cli.command);

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            tracing::debug!(code = %error.code, "command failed");
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Drops clap's usage footer; the recovery steps replace it.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_start_matches("error: ").trim_end().to_string()
}

/// Maps raw arguments to a known command path such as `analytics by-shop`.
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let words = raw_args
        .iter()
        .skip(1)
        .filter(|value| !value.starts_with('-'))
        .map(String::as_str)
        .collect::<Vec<&str>>();

    let group = *words.first()?;
    let leaves: &[&str] = match group {
        "ingest" => return Some("ingest".to_string()),
        "user" => &["register", "link-bot", "find-bot", "activate", "deactivate"],
        "shop" => &["list", "resolve", "update", "delete"],
        "pattern" => &["add", "list", "remove"],
        "receipt" => &["list", "show", "delete"],
        "analytics" => &["total", "monthly", "top-products", "by-shop"],
        _ => return None,
    };

    match words.get(1) {
        Some(leaf) if leaves.contains(leaf) => Some(format!("{group} {leaf}")),
        _ => Some(group.to_string()),
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if error.is_storage() || error.code.starts_with("internal_") {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{command_path_from_args, strip_clap_boilerplate};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn command_path_matches_known_leaves() {
        assert_eq!(
            command_path_from_args(&args(&["kvitok", "analytics", "by-shop", "--page", "x"])),
            Some("analytics by-shop".to_string())
        );
        assert_eq!(
            command_path_from_args(&args(&["kvitok", "ingest", "a.json"])),
            Some("ingest".to_string())
        );
        assert_eq!(
            command_path_from_args(&args(&["kvitok", "shop", "rename"])),
            Some("shop".to_string())
        );
        assert_eq!(command_path_from_args(&args(&["kvitok", "import"])), None);
    }

    #[test]
    fn clap_footer_is_removed() {
        let message = "error: unexpected argument '--x' found\n\nUsage: kvitok shop list\n\nFor more information, try '--help'.\n";
        assert_eq!(
            strip_clap_boilerplate(message),
            "unexpected argument '--x' found"
        );
    }
}
