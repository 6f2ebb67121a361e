use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Simon Boothroyd",
    version,
    about = "OpenFF Recharge CLI - An automated framework for generating optimized partial charges for molecules.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the electrostatic potential of a molecule with Psi4 and store
    /// the results.
    Generate(GenerateArgs),
    /// Generate the grid the ESP would be evaluated on, without running any
    /// QM calculation.
    Grid(GridArgs),
    /// Apply bond charge corrections to a molecule and report the per-atom
    /// charges.
    Charges(ChargesArgs),
}

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// The kekulized SMILES string of the molecule.
    #[arg(short, long, required = true, value_name = "SMILES")]
    pub smiles: String,

    /// Path to an XYZ file with one or more conformers of the molecule.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub conformers: PathBuf,

    /// Path of the JSON-lines store to append the computed records to.
    #[arg(short = 'o', long, required = true, value_name = "PATH")]
    pub store: PathBuf,

    /// Path to an ESP settings file in TOML format. Defaults are used when
    /// omitted.
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Override the grid spacing from the settings file, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub spacing: Option<f64>,

    /// Energy minimize each conformer before computing its ESP.
    #[arg(long)]
    pub minimize: bool,

    /// Skip the electric field and only compute the ESP.
    #[arg(long)]
    pub no_field: bool,

    /// Keep the Psi4 working directories under this path instead of using
    /// temporary directories.
    #[arg(long, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// The number of threads Psi4 may use per conformer.
    #[arg(short = 'j', long, default_value_t = 1, value_name = "NUM")]
    pub threads: usize,
}

/// Arguments for the `grid` subcommand.
#[derive(Args, Debug)]
pub struct GridArgs {
    /// The kekulized SMILES string of the molecule.
    #[arg(short, long, required = true, value_name = "SMILES")]
    pub smiles: String,

    /// Path to an XYZ file with the conformer to build the grid around. The
    /// first frame is used.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub conformers: PathBuf,

    /// Path to write the grid to, one `x y z` line per point.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// The grid spacing in Angstroms.
    #[arg(long, default_value_t = 0.5, value_name = "FLOAT")]
    pub spacing: f64,

    /// The inner van der Waals scale of the retained shell.
    #[arg(long, default_value_t = 1.4, value_name = "FLOAT")]
    pub inner_scale: f64,

    /// The outer van der Waals scale of the retained shell.
    #[arg(long, default_value_t = 2.0, value_name = "FLOAT")]
    pub outer_scale: f64,
}

/// Arguments for the `charges` subcommand.
#[derive(Args, Debug)]
pub struct ChargesArgs {
    /// The kekulized SMILES string of the molecule.
    #[arg(short, long, required = true, value_name = "SMILES")]
    pub smiles: String,

    /// Path to a CSV file of bond charge correction parameters
    /// (columns: first,second,bond,value). The built-in set is used when
    /// omitted.
    #[arg(long, value_name = "PATH")]
    pub corrections: Option<PathBuf>,

    /// Path to a JSON array of per-atom base charges. Zeros are used when
    /// omitted.
    #[arg(long, value_name = "PATH")]
    pub base_charges: Option<PathBuf>,

    /// Write the corrected charges to this path as a JSON array instead of
    /// printing them.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
