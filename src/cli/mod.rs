//! Command-line interface for mongodb-lang
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and argument overrides
//! - Reading the document from a file or stdin
//! - Printing analysis results as JSON on stdout
//!
//! Logs go to stderr so that stdout stays machine-readable.

use clap::{Parser, Subcommand};
use colored_json::prelude::*;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::config::{Config, LogLevel};
use crate::diagnostics;
use crate::error::Result;
use crate::parser::{Position, Selection};
use crate::visitor::{Analysis, Analyzer};

/// MongoDB playground language analysis
#[derive(Parser, Debug)]
#[command(
    name = "mongodb-lang",
    version,
    about = "MongoDB playground language analysis",
    long_about = "Static analysis for MongoDB playground scripts: completion context at a
cursor, namespace extraction, selection structure and interactive-syntax diagnostics."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Print single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for mongodb-lang
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Completion context at a cursor position
    Complete {
        /// Zero-indexed cursor line
        #[arg(long)]
        line: usize,

        /// Zero-indexed cursor character
        #[arg(long)]
        character: usize,

        /// Script file (stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Database and collection the script works on
    Namespace {
        /// Zero-indexed line bounding the `use` search
        #[arg(long)]
        line: usize,

        /// Zero-indexed character bounding the `use` search
        #[arg(long)]
        character: usize,

        /// Script file (stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Code structure around a selection
    Selection {
        #[arg(long)]
        start_line: usize,

        #[arg(long)]
        start_character: usize,

        #[arg(long)]
        end_line: usize,

        #[arg(long)]
        end_character: usize,

        /// Script file (stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Interactive shell syntax that is invalid in scripts
    Diagnostics {
        /// Script file (stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Show effective configuration
    Config,
}

/// JSON envelope of an analysis result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisOutput<'a, T> {
    parsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    state: &'a T,
}

impl<'a, T> AnalysisOutput<'a, T> {
    fn new(analysis: &'a Analysis<T>) -> Self {
        Self {
            parsed: !analysis.is_parse_failure(),
            reason: analysis.failure_reason(),
            state: analysis.state(),
        }
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_output_args(config, args);
        Self::apply_logging_args(config, args);
    }

    /// Apply output-related CLI arguments to configuration
    fn apply_output_args(config: &mut Config, args: &CliArgs) {
        if args.no_color {
            config.output.color = false;
        }
        if args.compact {
            config.output.pretty = false;
        }
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Run the selected subcommand
    pub fn run(&self) -> Result<()> {
        let analyzer = Analyzer::new(self.config.analysis.clone());

        match &self.args.command {
            Commands::Complete {
                line,
                character,
                file,
            } => {
                let text = read_input(file.as_deref())?;
                let analysis = analyzer.completion_context(&text, Position::new(*line, *character));
                self.print_json(&AnalysisOutput::new(&analysis))
            }
            Commands::Namespace {
                line,
                character,
                file,
            } => {
                let text = read_input(file.as_deref())?;
                let analysis = analyzer.namespace_context(&text, Position::new(*line, *character));
                self.print_json(&AnalysisOutput::new(&analysis))
            }
            Commands::Selection {
                start_line,
                start_character,
                end_line,
                end_character,
                file,
            } => {
                let text = read_input(file.as_deref())?;
                let selection = Selection::new(
                    Position::new(*start_line, *start_character),
                    Position::new(*end_line, *end_character),
                );
                let analysis = analyzer.selection_context(&text, selection);
                self.print_json(&AnalysisOutput::new(&analysis))
            }
            Commands::Diagnostics { file } => {
                let text = read_input(file.as_deref())?;
                let found = diagnostics::diagnostics(&text, &self.config.diagnostics);
                self.print_json(&found)
            }
            Commands::Config => {
                print!("{}", self.config.to_toml()?);
                Ok(())
            }
        }
    }

    /// Render a value as JSON according to the output configuration
    fn render_json<T: Serialize>(&self, value: &T) -> Result<String> {
        if !self.config.output.pretty {
            return Ok(serde_json::to_string(value)?);
        }

        let json_str = serde_json::to_string_pretty(value)?;
        if self.config.output.color {
            Ok(json_str.to_colored_json_auto().unwrap_or(json_str))
        } else {
            Ok(json_str)
        }
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.render_json(value)?);
        Ok(())
    }
}

/// Read the document from a file, or from stdin when no file is given
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                return Err("No script given: pass FILE or pipe the script on stdin".into());
            }
            Ok(std::io::read_to_string(stdin)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    fn interface(args: &[&str]) -> CliInterface {
        let args = CliArgs::try_parse_from(args).unwrap();
        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);
        CliInterface { args, config }
    }

    #[test]
    fn test_cli_definition() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_complete() {
        let args =
            CliArgs::try_parse_from(["mongodb-lang", "complete", "--line", "2", "--character", "5", "a.js"])
                .unwrap();
        match args.command {
            Commands::Complete {
                line,
                character,
                file,
            } => {
                assert_eq!((line, character), (2, 5));
                assert_eq!(file, Some(PathBuf::from("a.js")));
            }
            other => panic!("Expected complete command, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_requires_position() {
        assert!(CliArgs::try_parse_from(["mongodb-lang", "complete", "--line", "1"]).is_err());
    }

    #[test]
    fn test_logging_overrides() {
        let cli = interface(&["mongodb-lang", "config", "-v"]);
        assert_eq!(cli.config().logging.level, LogLevel::Debug);

        let cli = interface(&["mongodb-lang", "--vv", "config"]);
        assert_eq!(cli.config().logging.level, LogLevel::Trace);

        let cli = interface(&["mongodb-lang", "-q", "config"]);
        assert_eq!(cli.config().logging.level, LogLevel::Error);
    }

    #[test]
    fn test_output_overrides() {
        let cli = interface(&["mongodb-lang", "--compact", "--no-color", "config"]);
        assert!(!cli.config().output.pretty);
        assert!(!cli.config().output.color);

        let analysis = crate::visitor::completion_context("db.", Position::new(0, 3));
        let json = cli.render_json(&AnalysisOutput::new(&analysis)).unwrap();
        assert!(json.starts_with("{\"parsed\":true,\"state\":{"));
        assert!(json.contains("\"isCollectionSymbol\":true"));
    }

    #[test]
    fn test_parse_failure_output() {
        let cli = interface(&["mongodb-lang", "--compact", "config"]);
        let analysis = crate::visitor::namespace_context("use(", Position::new(0, 0));
        let json: serde_json::Value =
            serde_json::from_str(&cli.render_json(&AnalysisOutput::new(&analysis)).unwrap())
                .unwrap();
        assert_eq!(json["parsed"], false);
        assert!(json["reason"].is_string());
        assert!(json["state"]["databaseName"].is_null());
    }

    #[test]
    fn test_config_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\ndatabase_symbol = \"mdb\"").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let args = CliArgs::try_parse_from(["mongodb-lang", "--config", &path, "config"]).unwrap();
        let cli = CliInterface::from_args(args).unwrap();
        assert_eq!(cli.config().analysis.database_symbol, "mdb");
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "use('shop')").unwrap();
        assert_eq!(read_input(Some(file.path())).unwrap(), "use('shop')");
    }
}
