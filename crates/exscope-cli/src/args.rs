use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the exscope binary.
#[derive(Parser, Debug)]
#[command(
    name = "exscope",
    version,
    about = "Scope checker for pattern variables and output arguments"
)]
pub struct CliArgs {
    /// Procedure files in the JSON interchange form.
    pub files: Vec<PathBuf>,

    /// Path to exscope.json or a directory containing it.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Print the final configuration instead of analyzing.
    #[arg(long = "show-config", alias = "showConfig")]
    pub show_config: bool,

    // ==================== Output ====================
    /// Diagnostic output format.
    #[arg(long, value_enum, ignore_case = true, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable color in text output. Defaults to whether stdout is a terminal.
    #[arg(long)]
    pub pretty: Option<bool>,

    /// Print the scope tree of every procedure.
    #[arg(long = "dump-scopes", alias = "dumpScopes")]
    pub dump_scopes: bool,

    // ==================== Checks ====================
    /// Warn about declarations reaching their region through at least this
    /// many unbraced nested bodies.
    #[arg(long = "warn-nested-bleed", alias = "warnNestedBleed", value_name = "DEPTH")]
    pub warn_nested_bleed: Option<u32>,

    /// Report references that resolve to no declaration.
    #[arg(long = "check-references", alias = "checkReferences")]
    pub check_references: bool,

    /// Names that are always in scope when checking references.
    #[arg(long, value_delimiter = ',')]
    pub globals: Option<Vec<String>>,

    /// Deepest statement nesting accepted before analysis fails.
    #[arg(long = "max-nesting-depth", alias = "maxNestingDepth")]
    pub max_nesting_depth: Option<u32>,

    // ==================== Execution ====================
    /// Number of worker threads. Defaults to one per core.
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per diagnostic, with related locations.
    #[default]
    Text,
    /// A single JSON document with every procedure's diagnostics.
    Json,
}
