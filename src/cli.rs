//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TeamPulse - team performance survey service
///
/// Create surveys, collect eight-dimension assessments over HTTP, and
/// review aggregated results or export them as a spreadsheet.
///
/// Examples:
///   teampulse serve --bind 127.0.0.1:8080
///   teampulse surveys
///   teampulse summary 3f0c... --format json
///   teampulse export 3f0c... -o q3.xlsx
///   teampulse init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .teampulse.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path (or ":memory:")
    #[arg(long, value_name = "PATH", env = "TEAMPULSE_DATABASE", global = true)]
    pub database: Option<String>,

    /// Address the HTTP server listens on
    #[arg(long, value_name = "ADDR", env = "TEAMPULSE_BIND", global = true)]
    pub bind: Option<String>,

    /// Public base URL used when building survey links
    #[arg(long, value_name = "URL", env = "TEAMPULSE_PUBLIC_URL", global = true)]
    pub public_url: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands. Without one, the server is started.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP service
    Serve,

    /// List registered surveys
    Surveys,

    /// Print the aggregated results of a survey
    Summary {
        /// Survey identifier
        survey_id: String,

        /// Output format (text, json)
        #[arg(long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Write the spreadsheet export of a survey
    Export {
        /// Survey identifier
        survey_id: String,

        /// Output file (defaults to assessment_<ID>.xlsx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Generate a default .teampulse.toml configuration file
    InitConfig,
}

/// Output format for the summary command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown table (default)
    #[default]
    Text,
    /// JSON object
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to run, defaulting to `serve`.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.public_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Public URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref database) = self.database {
            if database.trim().is_empty() {
                return Err("Database path must not be empty".to_string());
            }
        }

        match self.command {
            Some(Command::Summary { ref survey_id, .. })
            | Some(Command::Export { ref survey_id, .. })
                if survey_id.trim().is_empty() =>
            {
                Err("Survey id must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Log filter implied by -v / -q, if either was given.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.quiet {
            Some(tracing::Level::ERROR)
        } else if self.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            database: None,
            bind: None,
            public_url: None,
            verbose: false,
            quiet: false,
            command: None,
        }
    }

    #[test]
    fn test_default_command_is_serve() {
        assert_eq!(make_args().command(), Command::Serve);
    }

    #[test]
    fn test_parse_subcommands() {
        let args = Args::try_parse_from(["teampulse", "summary", "abc", "--format", "json"]).unwrap();
        assert_eq!(
            args.command(),
            Command::Summary {
                survey_id: "abc".to_string(),
                format: OutputFormat::Json,
            }
        );

        let args = Args::try_parse_from(["teampulse", "export", "abc", "-o", "out.xlsx"]).unwrap();
        assert_eq!(
            args.command(),
            Command::Export {
                survey_id: "abc".to_string(),
                output: Some(PathBuf::from("out.xlsx")),
            }
        );

        let args = Args::try_parse_from(["teampulse", "serve", "--bind", "127.0.0.1:8080"]).unwrap();
        assert_eq!(args.bind.as_deref(), Some("127.0.0.1:8080"));
        assert_eq!(args.command(), Command::Serve);

        assert!(Args::try_parse_from(["teampulse", "init-config"]).is_ok());
        assert!(Args::try_parse_from(["teampulse", "summary"]).is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_public_url() {
        let mut args = make_args();
        args.public_url = Some("pulse.example.com".to_string());
        assert!(args.validate().is_err());

        args.public_url = Some("https://pulse.example.com".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_survey_id() {
        let mut args = make_args();
        args.command = Some(Command::Export {
            survey_id: " ".to_string(),
            output: None,
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), None);

        args.verbose = true;
        assert_eq!(args.log_level(), Some(tracing::Level::DEBUG));

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), Some(tracing::Level::ERROR));
    }
}
