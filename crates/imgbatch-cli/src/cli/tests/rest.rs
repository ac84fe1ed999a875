//! Tests for worker, config, and top-level parsing.

use super::{parse, parse_cli};
use crate::cli::{Cli, CliCommand};
use clap::{CommandFactory, Parser};
use imgbatch_core::logging::ProcessRole;
use std::path::Path;

#[test]
fn cli_parse_worker() {
    let command = parse(&["imgbatch", "worker"]);
    assert!(matches!(command, CliCommand::Worker));
    assert_eq!(command.process_role(), ProcessRole::Worker);
}

#[test]
fn worker_is_hidden_from_help() {
    let help = Cli::command().render_help().to_string();
    assert!(help.contains("run"));
    assert!(!help.contains("worker"));
}

#[test]
fn cli_parse_config() {
    let cli = parse_cli(&["imgbatch", "--config", "cfg.toml", "config"]);
    assert!(matches!(cli.command, CliCommand::Config));
    assert_eq!(cli.config.as_deref(), Some(Path::new("cfg.toml")));
    assert_eq!(cli.command.process_role(), ProcessRole::Scheduler);
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["imgbatch"]).is_err());
}
