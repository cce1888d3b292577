//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Waypress WordPress-export data pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file name (default: waypress.toml)
    #[arg(short = 'C', long, default_value = "waypress.toml")]
    pub config: PathBuf,

    /// WXR export file to ingest (overrides config)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Data directory for the persisted files (overrides config)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Parse the WXR export and write all data files
    Extract {
        /// Posts per chunk file
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Rebuild the author indexes by scanning existing post chunks
    Authors,

    /// Emit sitemap XML files and robots.txt from the extracted data
    Sitemap {
        /// Output directory for the XML files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Look up one post by slug and print it as JSON
    Get {
        /// The post slug
        slug: String,

        /// Print the post's JSON-LD blocks instead of the record
        #[arg(long)]
        schema: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::parse_from(["waypress", "extract", "--chunk-size", "100"]);
        assert!(matches!(
            cli.command,
            Commands::Extract {
                chunk_size: Some(100)
            }
        ));
    }

    #[test]
    fn test_parse_get_slug() {
        let cli = Cli::parse_from(["waypress", "get", "visiting-lisbon"]);
        match cli.command {
            Commands::Get { slug, schema } => {
                assert_eq!(slug, "visiting-lisbon");
                assert!(!schema);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_get_schema_flag() {
        let cli = Cli::parse_from(["waypress", "get", "--schema", "visiting-lisbon"]);
        assert!(matches!(cli.command, Commands::Get { schema: true, .. }));
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::parse_from([
            "waypress", "-s", "dump.xml", "-d", "out", "extract",
        ]);
        assert_eq!(cli.source, Some(PathBuf::from("dump.xml")));
        assert_eq!(cli.data_dir, Some(PathBuf::from("out")));
    }
}
