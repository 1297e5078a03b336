mod ai;
mod app;
mod config;
mod input;
mod models;
mod report;
mod tui;

use anyhow::{anyhow, Context, Result};
use app::{App, SubmitOutcome, FAILURE_MESSAGE, VALIDATION_MESSAGE};
use clap::{Args, Parser, Subcommand};
use config::Config;
use models::{JobInput, ResumeInput, TailoringResult};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tailor")]
#[command(about = "Tailor a resume to a job description with Gemini")]
struct Cli {
    /// Model to use (gemini-3-pro, gemini-2.5-pro, gemini-2.5-flash)
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive editor (default)
    Ui {
        /// Resume file to prefill
        #[arg(short, long)]
        resume: Option<PathBuf>,

        /// Job description file to prefill
        #[arg(short, long)]
        job: Option<PathBuf>,

        #[command(flatten)]
        labels: JobLabels,
    },

    /// Tailor once and print the result
    Run {
        /// Resume file
        #[arg(short, long)]
        resume: PathBuf,

        /// Job description file
        #[arg(short, long)]
        job: PathBuf,

        /// Write a markdown report to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        labels: JobLabels,
    },

    /// Print the response schema declared to the model
    Schema,
}

#[derive(Args, Default)]
struct JobLabels {
    /// Job title shown alongside the result
    #[arg(long)]
    job_title: Option<String>,

    /// Company name shown alongside the result
    #[arg(long)]
    company: Option<String>,
}

/// Everything a tailoring session needs once configuration has been read.
struct Session {
    spec: ai::ModelSpec,
    log_path: PathBuf,
    provider: Arc<dyn ai::AIProvider>,
    runtime: tokio::runtime::Runtime,
}

impl Session {
    fn start(model_override: Option<&str>) -> Result<Self> {
        let config = Config::from_env(model_override)?;
        let spec = ai::resolve_model(&config.model)?;
        let log_path = init_logging(&config)?;
        let provider = ai::create_provider(&spec, &config)?;
        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

        tracing::info!(model = %spec.model_id, "starting");

        Ok(Self {
            spec,
            log_path,
            provider,
            runtime,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Ui {
        resume: None,
        job: None,
        labels: JobLabels::default(),
    });

    match command {
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&ai::response_schema())?);
        }

        Commands::Ui {
            resume,
            job,
            labels,
        } => {
            let session = Session::start(cli.model.as_deref())?;
            let (resume, job) = load_inputs(resume.as_deref(), job.as_deref(), labels)?;
            tui::run(App::new(resume, job), session.provider, session.runtime.handle())?;
        }

        Commands::Run {
            resume,
            job,
            output,
            json,
            labels,
        } => {
            let session = Session::start(cli.model.as_deref())?;
            let (resume, job) = load_inputs(Some(&resume), Some(&job), labels)?;
            let mut app = App::new(resume, job);

            let request = match app.submit() {
                SubmitOutcome::Started(request) => request,
                SubmitOutcome::Invalid | SubmitOutcome::Busy => {
                    return Err(anyhow!(app.error().unwrap_or(VALIDATION_MESSAGE).to_string()));
                }
            };

            eprintln!("Tailoring resume with {}...", session.spec.short_name);
            let outcome = session.runtime.block_on(ai::tailor_resume(
                session.provider.as_ref(),
                &request.resume,
                &request.job,
            ));
            app.complete(outcome);

            let Some(result) = app.result() else {
                return Err(anyhow!(
                    "{} (details in {})",
                    app.error().unwrap_or(FAILURE_MESSAGE),
                    session.log_path.display()
                ));
            };

            if json {
                println!("{}", serde_json::to_string_pretty(result)?);
            } else {
                print_result(result);
            }

            if let Some(out_path) = output {
                report::write_report(&out_path, result, app.job())?;
                eprintln!("Report saved to: {}", out_path.display());
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Config) -> Result<PathBuf> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory: {}", config.log_dir.display()))?;

    let path = config.log_file();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid TAILOR_LOG filter: {}", config.log_filter))?;

    // The terminal belongs to the UI, so logs only go to the file.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .init();

    Ok(path)
}

fn read_input_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))
}

fn load_inputs(
    resume_path: Option<&Path>,
    job_path: Option<&Path>,
    labels: JobLabels,
) -> Result<(ResumeInput, JobInput)> {
    let resume = match resume_path {
        Some(path) => ResumeInput {
            file_name: Some(input::display_name(path)),
            ..ResumeInput::new(read_input_file(path)?)
        },
        None => ResumeInput::default(),
    };

    let mut job = match job_path {
        Some(path) => JobInput::new(read_input_file(path)?),
        None => JobInput::default(),
    };
    job.job_title = labels.job_title;
    job.company_name = labels.company;

    Ok((resume, job))
}

fn print_result(result: &TailoringResult) {
    println!("Match Score: {}", result.score_label());

    if !result.key_changes.is_empty() {
        println!("\nKey changes:");
        let options = textwrap::Options::new(78)
            .initial_indent("  - ")
            .subsequent_indent("    ");
        for change in &result.key_changes {
            println!("{}", textwrap::fill(change, &options));
        }
    }

    println!("\n--- Tailored Resume ---\n{}", result.tailored_resume);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults_to_ui() {
        let cli = Cli::try_parse_from(["tailor"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.model.is_none());
    }

    #[test]
    fn test_cli_run_arguments() {
        let cli = Cli::try_parse_from([
            "tailor",
            "run",
            "--resume",
            "cv.txt",
            "--job",
            "job.txt",
            "--json",
            "--model",
            "flash",
            "--job-title",
            "Senior Go Developer",
        ])
        .unwrap();
        assert_eq!(cli.model.as_deref(), Some("flash"));
        match cli.command {
            Some(Commands::Run {
                resume,
                job,
                json,
                output,
                labels,
            }) => {
                assert_eq!(resume, PathBuf::from("cv.txt"));
                assert_eq!(job, PathBuf::from("job.txt"));
                assert!(json);
                assert!(output.is_none());
                assert_eq!(labels.job_title.as_deref(), Some("Senior Go Developer"));
                assert!(labels.company.is_none());
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_run_requires_inputs() {
        assert!(Cli::try_parse_from(["tailor", "run", "--resume", "cv.txt"]).is_err());
    }

    #[test]
    fn test_load_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let resume_path = dir.path().join("cv.txt");
        let job_path = dir.path().join("job.md");
        std::fs::File::create(&resume_path)
            .unwrap()
            .write_all(b"Software Engineer with 5 years experience in Python")
            .unwrap();
        std::fs::write(&job_path, "Senior Go Developer").unwrap();

        let labels = JobLabels {
            job_title: None,
            company: Some("Acme".to_string()),
        };
        let (resume, job) = load_inputs(Some(&resume_path), Some(&job_path), labels).unwrap();
        assert_eq!(resume.content, "Software Engineer with 5 years experience in Python");
        assert_eq!(resume.file_name.as_deref(), Some("cv.txt"));
        assert_eq!(job.text, "Senior Go Developer");
        assert_eq!(job.company_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_load_inputs_missing_file() {
        let err = load_inputs(Some(Path::new("/nonexistent/cv.txt")), None, JobLabels::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }
}
