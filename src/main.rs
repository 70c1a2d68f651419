use clap::{Parser, ValueEnum};
use sastranslate::translate::{pddl_to_sas, SasTask, Task, TranslateOptions, TranslationOutcome};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Silent,
    Normal,
    Verbose,
    Debug,
}

impl From<Verbosity> for tracing::Level {
    fn from(value: Verbosity) -> Self {
        match value {
            Verbosity::Silent => tracing::Level::ERROR,
            Verbosity::Normal => tracing::Level::INFO,
            Verbosity::Verbose => tracing::Level::DEBUG,
            Verbosity::Debug => tracing::Level::TRACE,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Sas,
    Json,
}

#[derive(Parser)]
#[command(version)]
/// Translate a PDDL task into a finite-domain (SAS+) task.
struct Cli {
    #[arg(help = "The PDDL domain file")]
    domain: PathBuf,
    #[arg(help = "The PDDL problem instance file")]
    problem: PathBuf,
    #[arg(
        help = "The output file",
        short = 'o',
        long = "output",
        id = "OUTPUT",
        default_value = "output.sas"
    )]
    output: PathBuf,
    #[arg(
        value_enum,
        help = "The format of the output file",
        long = "format",
        id = "FORMAT",
        default_value_t = OutputFormat::Sas
    )]
    format: OutputFormat,
    #[arg(
        help = "A TOML file with translation options, overridden by the flags below",
        long = "config",
        id = "CONFIG"
    )]
    config: Option<PathBuf>,
    #[arg(
        help = "Maximum number of invariant candidates to consider",
        long = "max-candidates",
        id = "MAX_CANDIDATES"
    )]
    max_candidates: Option<usize>,
    #[arg(
        help = "Time limit for the invariant search, e.g. \"30s\" or \"5m\"",
        long = "max-time",
        id = "MAX_TIME",
        value_parser = humantime::parse_duration
    )]
    max_time: Option<Duration>,
    #[arg(
        help = "Keep every fact group instead of a partition of the facts",
        long = "full-encoding"
    )]
    full_encoding: bool,
    #[arg(help = "Drop all delete effects", long = "relaxed")]
    relaxed: bool,
    #[arg(help = "Refuse to translate tasks with axioms", long = "forbid-axioms")]
    forbid_axioms: bool,
    #[arg(
        help = "Keep facts that are unreachable in their domain transition graph",
        long = "keep-unreachable"
    )]
    keep_unreachable: bool,
    #[arg(
        value_enum,
        help = "The verbosity level",
        short = 'v',
        long = "verbosity",
        id = "VERBOSITY",
        default_value_t = Verbosity::Normal
    )]
    verbosity: Verbosity,
    #[arg(help = "Whether to use coloured output", short = 'c', long = "colour")]
    colour: bool,
}

impl Cli {
    fn options(&self) -> sastranslate::translate::Result<TranslateOptions> {
        let mut options = match &self.config {
            Some(path) => TranslateOptions::from_toml_path(path)?,
            None => TranslateOptions::default(),
        };
        if let Some(max_candidates) = self.max_candidates {
            options.invariant_max_candidates = max_candidates;
        }
        if let Some(max_time) = self.max_time {
            options.invariant_max_time = max_time;
        }
        options.partial_encoding &= !self.full_encoding;
        options.relaxed |= self.relaxed;
        options.forbid_axioms |= self.forbid_axioms;
        options.detect_unreachable &= !self.keep_unreachable;
        Ok(options)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level: tracing::Level = cli.verbosity.into();
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(cli.colour)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let options = cli.options()?;
    let task = Task::from_path(&cli.domain, &cli.problem)?;
    info!(elapsed = start.elapsed().as_secs_f64(), "parsed task");

    let outcome = pddl_to_sas(task, &options)?;
    let sas_task = match &outcome {
        TranslationOutcome::Solvable(sas_task) => sas_task,
        TranslationOutcome::Unsolvable { reason, task } => {
            info!(reason = reason.as_str(), "writing unsolvable task");
            task
        }
        TranslationOutcome::AxiomsNotSupported => {
            error!("the task needs axioms, which are forbidden");
            return Ok(ExitCode::FAILURE);
        }
    };
    write_output(sas_task, &cli.output, cli.format)?;
    info!(
        output = %cli.output.display(),
        elapsed = start.elapsed().as_secs_f64(),
        "done"
    );
    Ok(ExitCode::SUCCESS)
}

fn write_output(
    task: &SasTask,
    path: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Sas => task.write_sas_file(path)?,
        OutputFormat::Json => std::fs::write(path, serde_json::to_string_pretty(task)?)?,
    }
    Ok(())
}
