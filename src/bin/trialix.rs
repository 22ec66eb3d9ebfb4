//! Trialix - clinical trial enrichment CLI
//!
//! Command-line interface for biomarker discovery and enrollment-criteria
//! optimization.

use clap::{Parser, Subcommand, ValueEnum};
use trialix::benchmark::{generate_trial, SyntheticTrialConfig};
use trialix::data::RawTable;
use trialix::error::{Result, TrialixError};
use trialix::pipeline::{run_analysis, run_validation, AnalysisConfig, AnalysisReport, CancellationToken};
use trialix::report::{
    cutoff_rows, export, ranking_rows, render_criteria, render_cutoffs, render_ranking,
    render_summary, screening_rows, to_json, write_csv_rows, ExportFormat,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Default output directory for `analyze`.
const DEFAULT_OUTPUT_DIR: &str = "./trialix_results";

/// CLI-friendly export format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    /// Ranking and cutoff tables as CSV
    Csv,
    /// Enrichment summary as JSON
    Json,
    /// Both
    All,
}

impl From<CliFormat> for ExportFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Csv => ExportFormat::Csv,
            CliFormat::Json => ExportFormat::Json,
            CliFormat::All => ExportFormat::All,
        }
    }
}

/// Analysis parameters shared by `analyze` and `screen`.
#[derive(Debug, clap::Args)]
struct AnalysisArgs {
    /// Name of the outcome column (responder/non_responder, 1/0 or yes/no)
    #[arg(short, long)]
    outcome: Option<String>,

    /// Analysis configuration YAML; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the patient identifier column
    #[arg(long)]
    patient_id: Option<String>,

    /// Number of top biomarkers passed to cutoff optimization
    #[arg(short = 'n', long)]
    top_n: Option<usize>,

    /// Minimum AUC for a biomarker to be eligible
    #[arg(short = 'a', long)]
    min_auc: Option<f64>,

    /// Maximum number of enrollment criteria
    #[arg(long)]
    max_criteria: Option<usize>,

    /// Minimum fraction of patients that must remain eligible
    #[arg(long)]
    min_eligible_fraction: Option<f64>,

    /// Restrict the analysis to these biomarkers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    biomarkers: Option<Vec<String>>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    threads: Option<usize>,
}

impl AnalysisArgs {
    /// Resolve the configuration file and flag overrides.
    fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        match &self.outcome {
            Some(outcome) => config.outcome_column = outcome.clone(),
            None if self.config.is_none() => {
                return Err(TrialixError::InvalidParameter(
                    "--outcome is required unless --config names the outcome column".into(),
                ));
            }
            None => {}
        }
        if let Some(v) = &self.patient_id {
            config.patient_id_column = v.clone();
        }
        if let Some(v) = self.top_n {
            config.top_n = v;
        }
        if let Some(v) = self.min_auc {
            config.min_auc = v;
        }
        if let Some(v) = self.max_criteria {
            config.max_criteria = v;
        }
        if let Some(v) = self.min_eligible_fraction {
            config.min_eligible_fraction = v;
        }
        if let Some(v) = &self.biomarkers {
            config.biomarkers = Some(v.clone());
        }
        if let Some(v) = self.threads {
            config.threads = Some(v);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Clinical trial enrichment analysis
#[derive(Parser)]
#[command(name = "trialix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank biomarkers, optimize cutoffs and recommend enrollment criteria
    Analyze {
        /// Path to trial CSV
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Output directory
        #[arg(short = 'd', long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: CliFormat,

        /// Print the full report as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Check a trial CSV against the dataset rules
    Validate {
        /// Path to trial CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Name of the outcome column
        #[arg(short, long)]
        outcome: String,

        /// Name of the patient identifier column
        #[arg(long, default_value = "patient_id")]
        patient_id: String,
    },

    /// Derive criteria from a historical trial and screen new patients
    Screen {
        /// Historical trial CSV used to derive the criteria
        #[arg(short, long)]
        train: PathBuf,

        /// New patients CSV (no outcome column needed)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Output CSV (patient_id,eligible); stdout if omitted
        #[arg(short = 'w', long)]
        output: Option<PathBuf>,
    },

    /// Generate a synthetic oncology trial
    Simulate {
        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Number of patients
        #[arg(short = 'n', long, default_value = "150")]
        patients: usize,

        /// Fraction of responders
        #[arg(long, default_value = "0.38")]
        response_rate: f64,

        /// Fraction of patients with a missing biomarker value
        #[arg(long, default_value = "0.05")]
        missing: f64,

        /// Extra biomarkers unrelated to the outcome
        #[arg(long, default_value = "0")]
        null_biomarkers: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Write a default analysis configuration
    ExampleConfig {
        /// Output YAML; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            input,
            analysis,
            output,
            format,
            json,
        } => cmd_analyze(&input, &analysis, &output, format.into(), json),

        Commands::Validate {
            input,
            outcome,
            patient_id,
        } => cmd_validate(&input, &outcome, &patient_id),

        Commands::Screen {
            train,
            input,
            analysis,
            output,
        } => cmd_screen(&train, &input, &analysis, output.as_deref()),

        Commands::Simulate {
            output,
            patients,
            response_rate,
            missing,
            null_biomarkers,
            seed,
        } => cmd_simulate(&output, patients, response_rate, missing, null_biomarkers, seed),

        Commands::ExampleConfig { output } => cmd_example_config(output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load(path: &Path) -> Result<RawTable> {
    eprintln!("Loading data from {:?}...", path);
    RawTable::from_csv(path)
}

/// Run the full analysis and export results
fn cmd_analyze(
    input: &Path,
    args: &AnalysisArgs,
    output: &Path,
    format: ExportFormat,
    json: bool,
) -> Result<()> {
    let config = args.resolve()?;
    let table = load(input)?;
    let report = run_analysis(&table, &config, &CancellationToken::new())?;

    if json {
        println!("{}", to_json(&report)?);
    } else {
        print_report(&report);
    }

    eprintln!("Writing results to {:?}...", output);
    for path in export(&report, output, format)? {
        eprintln!("  {}", path.display());
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("DATASET");
    println!("{}", render_summary(&report.summary));
    println!("BIOMARKER RANKINGS (min AUC {:.2})", report.config.min_auc);
    println!("{}", render_ranking(&ranking_rows(&report.ranking)));
    if report.ranking.n_eligible() == 0 {
        println!(
            "No biomarker reached AUC >= {:.2}; nothing to optimize.\n",
            report.config.min_auc
        );
    } else {
        println!("OPTIMAL CUTOFFS (Youden's index)");
        println!("{}", render_cutoffs(&cutoff_rows(&report.cutoffs)));
    }
    println!("{}", render_criteria(&report.criteria));
}

/// Validate input data and report the violated rule, if any
fn cmd_validate(input: &Path, outcome: &str, patient_id: &str) -> Result<()> {
    let table = load(input)?;
    let config = AnalysisConfig::new(outcome).patient_id_column(patient_id);

    match run_validation(&table, &config) {
        Ok((_, summary)) => {
            println!("Validation passed");
            println!();
            print!("{}", render_summary(&summary));
            Ok(())
        }
        Err(TrialixError::Data(e)) => {
            println!("Validation FAILED: {}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}

/// Derive criteria from historical data, then screen new patients
fn cmd_screen(train: &Path, input: &Path, args: &AnalysisArgs, output: Option<&Path>) -> Result<()> {
    let config = args.resolve()?;
    let table = load(train)?;
    let report = run_analysis(&table, &config, &CancellationToken::new())?;
    let criteria = &report.criteria;

    eprintln!("Criteria:");
    if criteria.is_empty() {
        eprintln!("  (none: {})", criteria.status);
    }
    for c in criteria.criterion_strings() {
        eprintln!("  {}", c);
    }

    let new_patients = load(input)?;
    let screened = criteria.screen(&new_patients, &config.patient_id_column)?;
    let n_eligible = screened.iter().filter(|(_, e)| *e).count();

    let rows = screening_rows(&screened);
    match output {
        Some(path) => {
            write_csv_rows(BufWriter::new(File::create(path)?), &rows)?;
            eprintln!("Wrote {:?}", path);
        }
        None => write_csv_rows(std::io::stdout().lock(), &rows)?,
    }
    eprintln!("Done! {}/{} patients eligible", n_eligible, screened.len());
    Ok(())
}

/// Generate a synthetic trial CSV
fn cmd_simulate(
    output: &Path,
    patients: usize,
    response_rate: f64,
    missing: f64,
    null_biomarkers: usize,
    seed: u64,
) -> Result<()> {
    let config = SyntheticTrialConfig::oncology()
        .with_patients(patients)
        .with_response_rate(response_rate)
        .with_missing_fraction(missing)
        .with_null_biomarkers(null_biomarkers)
        .with_seed(seed);
    let trial = generate_trial(&config)?;
    trial.table.to_csv(output)?;
    eprintln!(
        "Wrote {} patients ({} responders) to {:?}",
        trial.table.n_rows(),
        trial.n_responders,
        output
    );
    Ok(())
}

/// Write a default configuration
fn cmd_example_config(output: Option<&Path>) -> Result<()> {
    let yaml = AnalysisConfig::default().to_yaml()?;
    match output {
        Some(path) => {
            std::fs::write(path, yaml)?;
            eprintln!("Wrote {:?}", path);
        }
        None => print!("{}", yaml),
    }
    Ok(())
}
