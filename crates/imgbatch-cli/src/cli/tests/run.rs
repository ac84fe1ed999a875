//! Tests for the run subcommand.

use super::{parse, parse_cli};
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_run_defaults() {
    match parse(&["imgbatch", "run"]) {
        CliCommand::Run {
            input,
            output,
            workers,
            timeout_ms,
            json,
        } => {
            assert!(input.is_none());
            assert!(output.is_none());
            assert!(workers.is_none());
            assert!(timeout_ms.is_none());
            assert!(!json);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_overrides() {
    match parse(&[
        "imgbatch",
        "run",
        "--input",
        "/photos",
        "--output",
        "/tmp/out",
        "--workers",
        "3",
        "--timeout-ms",
        "2500",
        "--json",
    ]) {
        CliCommand::Run {
            input,
            output,
            workers,
            timeout_ms,
            json,
        } => {
            assert_eq!(input.as_deref(), Some(Path::new("/photos")));
            assert_eq!(output.as_deref(), Some(Path::new("/tmp/out")));
            assert_eq!(workers, Some(3));
            assert_eq!(timeout_ms, Some(2500));
            assert!(json);
        }
        _ => panic!("expected Run with overrides"),
    }
}

#[test]
fn cli_parse_global_config_after_subcommand() {
    let cli = parse_cli(&["imgbatch", "run", "--config", "/etc/imgbatch.toml"]);
    assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/imgbatch.toml")));
    assert!(matches!(cli.command, CliCommand::Run { .. }));
}

#[test]
fn cli_parse_run_rejects_non_numeric_workers() {
    assert!(Cli::try_parse_from(["imgbatch", "run", "--workers", "many"]).is_err());
}
