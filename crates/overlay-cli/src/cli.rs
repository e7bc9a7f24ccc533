//! Command-line arguments for `overlay-viewer`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use overlay_model::OverlayKind;

#[derive(Parser)]
#[command(
    name = "overlay-viewer",
    version,
    about = "Browse NIST SP 800-53 controls with FedRAMP and CNSSI overlays",
    long_about = "Browse the NIST SP 800-53 Rev 5 control catalog merged with the\n\
                  FedRAMP High, CNSSI 1253, Classified Information and FedRAMP+\n\
                  overlays.\n\n\
                  Overlay precedence (lowest to highest): FedRAMP High, CNSSI 1253,\n\
                  Classified Information, FedRAMP+."
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

    /// Explicit log level (overrides -v/-q flags and RUST_LOG).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
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

    /// Directory holding the catalog, overlay files and optional overlays.toml
    /// (default: $OVERLAY_DATA_DIR, then ./data).
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List controls matching a query, family and overlay selection.
    Controls(ControlsArgs),

    /// Show one control with its overlay annotations.
    Show(ShowArgs),

    /// List control families with total and selected counts.
    Families(FamiliesArgs),

    /// Report what the data directory provides, as JSON.
    Doctor,

    /// Rewrite a catalog file in natural control order.
    SortCatalog(SortCatalogArgs),

    /// Compare two revisions of an overlay file.
    Compare(CompareArgs),
}

/// Overlay toggles shared by the listing commands.
#[derive(Args, Clone, Default)]
pub struct OverlayToggles {
    /// Enable only these overlays (repeat or comma-separate; default: all).
    #[arg(long = "overlay", value_name = "OVERLAY", value_delimiter = ',')]
    pub only: Vec<OverlayKind>,

    /// Switch these overlays off.
    #[arg(long = "disable", value_name = "OVERLAY", value_delimiter = ',')]
    pub disable: Vec<OverlayKind>,
}

#[derive(Args)]
pub struct ControlsArgs {
    /// Case-insensitive substring of the id, name or control text.
    #[arg(long = "query", short = 's', value_name = "TEXT")]
    pub query: Option<String>,

    /// Restrict to one family code (for example AC).
    #[arg(long = "family", short = 'f', value_name = "CODE")]
    pub family: Option<String>,

    #[command(flatten)]
    pub overlays: OverlayToggles,

    /// Include controls no enabled overlay selects.
    #[arg(long = "show-unselected", short = 'a')]
    pub show_unselected: bool,

    /// Print JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Control identifier, for example AC-2 or AC-2(1).
    #[arg(value_name = "ID")]
    pub id: String,

    #[command(flatten)]
    pub overlays: OverlayToggles,

    /// Print JSON instead of text.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct FamiliesArgs {
    #[command(flatten)]
    pub overlays: OverlayToggles,

    /// Print JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct SortCatalogArgs {
    /// Catalog JSON file to sort.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write the sorted catalog (default: overwrite INPUT).
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompareArgs {
    /// Overlay the two files belong to.
    #[arg(value_name = "OVERLAY")]
    pub overlay: OverlayKind,

    /// Older overlay revision.
    #[arg(value_name = "OLD")]
    pub old: PathBuf,

    /// Newer overlay revision.
    #[arg(value_name = "NEW")]
    pub new: PathBuf,

    /// Print JSON instead of tables.
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
