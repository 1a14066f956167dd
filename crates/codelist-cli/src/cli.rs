//! CLI argument definitions for the codelist enum tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "codelist-enums",
    version,
    about = "Synchronize JSON Schema enums with closed codelist CSV files",
    long_about = "Set the enum of every closed codelist property in JSON Schema files to the\n\
                  codes of its codelist.\n\n\
                  Codelists are read from each directory's codelists/ folder. Files named\n\
                  +name.csv add codes to name.csv and -name.csv remove codes from it;\n\
                  directories are layered in the order given."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Set the enums of closed codelist properties from codelist files.
    SetClosedEnums(SetClosedEnumsArgs),

    /// List the resolved codelists of each directory.
    List(ListArgs),
}

#[derive(Parser)]
pub struct SetClosedEnumsArgs {
    /// Directories containing schema files and a codelists/ folder, in layering order.
    #[arg(value_name = "DIRECTORY", required = true)]
    pub directories: Vec<PathBuf>,

    /// Schema file name to update (repeatable; default: release-schema.json).
    #[arg(long = "schema-file", value_name = "NAME")]
    pub schema_files: Vec<String>,

    /// Match removal codes (-name.csv) ignoring case.
    #[arg(long = "case-insensitive-removals")]
    pub case_insensitive_removals: bool,

    /// Report changes without writing schema files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Directories containing a codelists/ folder, in layering order.
    #[arg(value_name = "DIRECTORY", required = true)]
    pub directories: Vec<PathBuf>,

    /// Match removal codes (-name.csv) ignoring case.
    #[arg(long = "case-insensitive-removals")]
    pub case_insensitive_removals: bool,

    /// Print the resolved codelists as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
