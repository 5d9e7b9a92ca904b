//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "folio")]
#[command(about = "Computes component-based financial documents.")]
#[command(version)]
pub struct CommandLine {
    /// Config file (default: $FOLIO_CONFIG or folio.toml in the config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute one or more document files
    #[command(alias = "c")]
    Compute {
        #[arg(required = true)]
        documents: Vec<PathBuf>,
    },
    /// Apply an edit script to a document
    #[command(alias = "e")]
    Edit { document: PathBuf, edits: PathBuf },
    /// List the built-in definition sets
    #[command(alias = "p")]
    Presets,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compute_many() {
        let cli = CommandLine::parse_from(["folio", "compute", "a.json", "b.json", "--compact"]);
        assert!(cli.compact);
        match cli.command {
            Commands::Compute { documents } => assert_eq!(documents.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_compute_requires_a_document() {
        assert!(CommandLine::try_parse_from(["folio", "compute"]).is_err());
    }

    #[test]
    fn test_parse_edit_with_config() {
        let cli = CommandLine::parse_from([
            "folio",
            "--config",
            "folio.toml",
            "e",
            "doc.json",
            "edits.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("folio.toml")));
        assert!(matches!(cli.command, Commands::Edit { .. }));
    }
}
