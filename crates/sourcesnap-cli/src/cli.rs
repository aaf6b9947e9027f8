//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::client::{CliError, CliResult};
use crate::commands::snapshot::handle_snapshot;

/// Parses CLI arguments, executes the requested command and returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Snapshot(args) => handle_snapshot(&args, cli.output).await,
    }
}

#[derive(Parser)]
#[command(name = "sourcesnap", about = "Mirror a repository subtree into an object store")]
pub(crate) struct Cli {
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Json,
        help = "Select output format for the snapshot result"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run one snapshot and print its result.
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
pub(crate) struct SnapshotArgs {
    #[arg(long, help = "Repository owner")]
    pub(crate) owner: String,
    #[arg(long, help = "Repository name")]
    pub(crate) repo: String,
    #[arg(long = "ref", help = "Branch, tag or commit to mirror")]
    pub(crate) git_ref: String,
    #[arg(
        long,
        default_value = "",
        help = "Directory or file inside the repository; empty mirrors the whole tree"
    )]
    pub(crate) path: String,
    #[arg(
        long = "segment",
        required = true,
        help = "Destination identity segment; repeat for each level under user/"
    )]
    pub(crate) segments: Vec<String>,
    #[arg(long, env = "SOURCE_BUCKET_NAME", help = "Destination container")]
    pub(crate) container: String,
    #[arg(
        long,
        conflicts_with = "store_endpoint",
        help = "Write objects under this directory"
    )]
    pub(crate) store_root: Option<PathBuf>,
    #[arg(long, value_parser = parse_url, help = "Upload objects to this HTTP endpoint")]
    pub(crate) store_endpoint: Option<Url>,
    #[arg(long, env = "SOURCESNAP_STORE_TOKEN", hide_env_values = true)]
    pub(crate) store_token: Option<String>,
    #[arg(long, env = "SOURCESNAP_ORIGIN_TOKEN", hide_env_values = true)]
    pub(crate) origin_token: Option<String>,
    #[arg(
        long,
        env = "SOURCESNAP_GITHUB_API_URL",
        value_parser = parse_url,
        default_value = sourcesnap_origin::DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(long, default_value_t = sourcesnap_engine::DEFAULT_MAX_IN_FLIGHT)]
    pub(crate) max_in_flight: usize,
    #[arg(long, help = "Abort the snapshot after this many seconds")]
    pub(crate) deadline_secs: Option<u64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Json,
    Table,
}

pub(crate) fn parse_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|err| err.to_string())?;
    if url.cannot_be_a_base() {
        return Err(format!("{value} cannot carry a path"));
    }
    Ok(url)
}

impl SnapshotArgs {
    /// Origin credential with blanks treated as absent.
    pub(crate) fn origin_token(&self) -> CliResult<&str> {
        self.origin_token
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                CliError::validation(
                    "origin token is required (flag --origin-token or SOURCESNAP_ORIGIN_TOKEN)",
                )
            })
    }

    pub(crate) fn check_limits(&self) -> CliResult<()> {
        if self.max_in_flight == 0 {
            return Err(CliError::validation("--max-in-flight must be at least 1"));
        }
        if self.deadline_secs == Some(0) {
            return Err(CliError::validation("--deadline-secs must be positive"));
        }
        if self.store_root.is_none() && self.store_endpoint.is_none() {
            return Err(CliError::validation(
                "a store is required (flag --store-root or --store-endpoint)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn parse(extra: &[&str]) -> Result<SnapshotArgs> {
        let mut argv = vec![
            "sourcesnap",
            "snapshot",
            "--owner",
            "octo",
            "--repo",
            "demo",
            "--ref",
            "main",
            "--segment",
            "42",
            "--segment",
            "job1",
            "--container",
            "bucket",
        ];
        argv.extend_from_slice(extra);
        let cli = Cli::try_parse_from(argv)?;
        let Command::Snapshot(args) = cli.command;
        Ok(args)
    }

    #[test]
    fn snapshot_arguments_parse_with_defaults() -> Result<()> {
        let args = parse(&["--store-root", "/tmp/store", "--origin-token", "gh"])?;
        assert_eq!(args.git_ref, "main");
        assert_eq!(args.segments, vec!["42".to_string(), "job1".to_string()]);
        assert_eq!(args.path, "");
        assert_eq!(args.max_in_flight, sourcesnap_engine::DEFAULT_MAX_IN_FLIGHT);
        assert_eq!(args.origin_token()?, "gh");
        args.check_limits()?;
        Ok(())
    }

    #[test]
    fn store_flags_conflict() {
        assert!(
            parse(&[
                "--store-root",
                "/tmp/store",
                "--store-endpoint",
                "https://objects.example/"
            ])
            .is_err()
        );
    }

    #[test]
    fn segment_is_required() {
        let parsed = Cli::try_parse_from([
            "sourcesnap",
            "snapshot",
            "--owner",
            "octo",
            "--repo",
            "demo",
            "--ref",
            "main",
            "--container",
            "bucket",
            "--store-root",
            "/tmp/store",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn limits_and_store_are_validated() -> Result<()> {
        let zero = parse(&["--store-root", "/tmp/store", "--max-in-flight", "0"])?;
        assert_eq!(zero.check_limits().map_err(|err| err.exit_code()), Err(2));

        let deadline = parse(&["--store-root", "/tmp/store", "--deadline-secs", "0"])?;
        assert_eq!(deadline.check_limits().map_err(|err| err.exit_code()), Err(2));

        let storeless = parse(&[])?;
        assert_eq!(storeless.check_limits().map_err(|err| err.exit_code()), Err(2));
        Ok(())
    }

    #[test]
    fn blank_origin_token_is_a_validation_error() -> Result<()> {
        let args = parse(&["--store-root", "/tmp/store", "--origin-token", "  "])?;
        assert_eq!(args.origin_token().map_err(|err| err.exit_code()), Err(2));
        Ok(())
    }

    #[test]
    fn endpoint_must_carry_a_path() {
        assert!(parse_url("mailto:ops@example.com").is_err());
        assert!(parse_url("https://objects.example/v1").is_ok());
    }
}
