//! step-fuse command line: fuse two STEP models, connect the result and export it as BREP.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fuse_kernel::{KernelSettings, TruckKernel};
use fuse_ops::{run_pipeline, FuseJob, PipelineReport};
use fuse_types::ThreadCount;
use log::{debug, error, warn};

pub mod config;
pub mod error;

pub use config::{FuseConfig, LogLevel};
pub use error::CliError;

/// step-fuse command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "step-fuse",
    version,
    about = "Fuse two STEP models, merge their coincident topology and export the result as BREP"
)]
pub struct CliArgs {
    /// Number of worker threads for the connect pass.
    #[arg(value_name = "NUM_THREADS")]
    pub threads: ThreadCount,
    /// Path to TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Surface model, imported first.
    #[arg(long, value_name = "FILE")]
    pub surface: Option<PathBuf>,
    /// Volume model, imported second.
    #[arg(long, value_name = "FILE")]
    pub volume: Option<PathBuf>,
    /// Directory for the BREP output.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
    /// Run the connect pass sequentially.
    #[arg(long)]
    pub sequential: bool,
    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

pub fn run() -> ExitCode {
    run_from(std::env::args_os())
}

/// Parse `args` (program name first), run the pipeline and print the two result lines.
pub fn run_from<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match CliArgs::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout and succeed; real usage errors exit 1.
            if let Err(print_err) = err.print() {
                eprintln!("{err}: {print_err}");
            }
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match FuseConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return err.exit_code();
        }
    };

    init_logger(&resolve_log_level(&cli, &config));

    let (settings, job) = resolve(&cli, config);
    match execute(settings, &job) {
        Ok(report) => {
            for warning in &report.warnings {
                debug!("pipeline warning: {warning}");
            }
            println!("Connected shape exported to {}", report.output_path.display());
            println!(
                "Total execution time with {} threads: {:.9} seconds",
                job.threads,
                report.connect_time.as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    }
}

fn execute(settings: KernelSettings, job: &FuseJob) -> Result<PipelineReport, CliError> {
    let mut kernel = TruckKernel::with_settings(settings)?;
    Ok(run_pipeline(&mut kernel, job)?)
}

/// Merge CLI flags over the config file into kernel settings and a job.
pub fn resolve(cli: &CliArgs, mut config: FuseConfig) -> (KernelSettings, FuseJob) {
    if let Some(surface) = &cli.surface {
        debug!("CLI override: surface = {}", surface.display());
        config.surface = surface.clone();
    }
    if let Some(volume) = &cli.volume {
        debug!("CLI override: volume = {}", volume.display());
        config.volume = volume.clone();
    }
    if let Some(dir) = &cli.output_dir {
        debug!("CLI override: output_dir = {}", dir.display());
        config.output_dir = Some(dir.clone());
    }
    if cli.sequential {
        if config.run_parallel {
            warn!("--sequential overrides run_parallel = true from the config");
        }
        config.run_parallel = false;
    }

    let settings = KernelSettings {
        threads: Some(cli.threads),
        fuse_tolerance: config.fuse_tolerance,
        connect_tolerance: config.connect_tolerance,
        tessellation_ratio: config.tessellation_ratio,
    };
    let job = FuseJob {
        surface_path: config.surface,
        volume_path: config.volume,
        output_dir: config.output_dir,
        threads: cli.threads,
        run_parallel: config.run_parallel,
    };
    (settings, job)
}

/// `--log-level`, then `RUST_LOG`, then the config file, then `info`.
fn resolve_log_level(cli: &CliArgs, config: &FuseConfig) -> String {
    if let Some(level) = cli.log_level {
        return level.as_str().to_string();
    }

    if let Ok(level) = std::env::var("RUST_LOG") {
        if !level.trim().is_empty() {
            return level;
        }
    }

    if let Some(level) = config.log_level {
        return level.as_str().to_string();
    }

    "info".to_string()
}

fn init_logger(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_filters(level);
    builder.format(|buf, record| {
        use std::io::Write;
        let module = record.module_path().unwrap_or(record.target());
        writeln!(
            buf,
            "{} [{}] {}: {}",
            buf.timestamp_millis(),
            record.level(),
            module,
            record.args()
        )
    });

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}
