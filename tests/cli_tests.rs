//! Argument parsing tests for the `ragkit` binary.

use clap::Parser;
use ragkit::cli::{Cli, Commands};
use std::path::PathBuf;

#[test]
fn test_defaults() {
    let cli = Cli::try_parse_from(["ragkit", "stats"]).unwrap();
    assert_eq!(cli.config, PathBuf::from("ragkit.toml"));
    assert!(!cli.verbose);
    assert!(!cli.no_color);
    assert_eq!(cli.command, Commands::Stats);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli =
        Cli::try_parse_from(["ragkit", "init", "--config", "other.toml", "--no-color", "-v"])
            .unwrap();
    assert_eq!(cli.config, PathBuf::from("other.toml"));
    assert!(cli.no_color);
    assert!(cli.verbose);
    assert_eq!(cli.command, Commands::Init);
}

#[test]
fn test_ingest_texts_and_file() {
    let cli = Cli::try_parse_from(["ragkit", "ingest", "first", "second", "--file", "docs.txt"])
        .unwrap();
    assert_eq!(
        cli.command,
        Commands::Ingest {
            texts: vec!["first".to_string(), "second".to_string()],
            file: Some(PathBuf::from("docs.txt")),
        }
    );
}

#[test]
fn test_query_and_ask_take_k() {
    let cli = Cli::try_parse_from(["ragkit", "query", "what is hnsw", "-k", "5"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Query {
            question: "what is hnsw".to_string(),
            k: Some(5),
        }
    );

    let cli = Cli::try_parse_from(["ragkit", "ask", "why"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Ask {
            question: "why".to_string(),
            k: None,
        }
    );
}

#[test]
fn test_drop_confirmation_flag() {
    let cli = Cli::try_parse_from(["ragkit", "drop", "--yes"]).unwrap();
    assert_eq!(cli.command, Commands::Drop { yes: true });
}

#[test]
fn test_rejects_bad_input() {
    assert!(Cli::try_parse_from(["ragkit"]).is_err());
    assert!(Cli::try_parse_from(["ragkit", "query"]).is_err());
    assert!(Cli::try_parse_from(["ragkit", "query", "q", "-k", "many"]).is_err());
    assert!(Cli::try_parse_from(["ragkit", "serve"]).is_err());
}
