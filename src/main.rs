use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use ead_fetch::catalog::{limit_records, load_records};
use ead_fetch::config::{ConfigLoader, ConfigOverrides};
use ead_fetch::engine::{EngineSettings, FetchEngine};
use ead_fetch::fetcher::HttpFetcher;
use ead_fetch::metrics::MetricsSnapshot;
use ead_fetch::output::{write_report, DocumentStore, REPORT_FILE_NAME};
use ead_fetch::progress;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ead-fetch")]
#[command(version)]
#[command(about = "Bulk download EAD XML from an Archon site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the EAD of every collection in the input file
    Run {
        /// Optional configuration file (JSON/YAML/TOML); flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// CSV or JSON file listing the Archon collections
        #[arg(short, long)]
        file: Option<String>,

        /// Base URL of the Archon site (e.g., https://archon-site.edu)
        #[arg(long)]
        host: Option<String>,

        /// Number of request workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output directory for fetched XML and the report
        #[arg(short, long)]
        output: Option<String>,

        /// Seconds to allow a single request to take
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Requests per second across all workers
        #[arg(long)]
        ratelimit: Option<u32>,

        /// Fields used to name files, in order: CollectionIdentifier, Title
        /// (e.g. Title,CollectionIdentifier). Defaults to ead_<ID>.xml.
        #[arg(long)]
        eadname: Option<String>,

        /// Only fetch the first N collections
        #[arg(long)]
        test: Option<usize>,

        /// Retries per collection after a timeout
        #[arg(long)]
        max_retries: Option<u32>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,

        /// Do not check that the host is reachable before starting
        #[arg(long)]
        skip_host_check: bool,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info"); }
    }
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_default_env().build();
    let multi = indicatif::MultiProgress::new();

    match cli.command {
        Commands::Run {
            config,
            file,
            host,
            workers,
            output,
            timeout,
            ratelimit,
            eadname,
            test,
            max_retries,
            no_progress,
            skip_host_check,
        } => {
            let show_progress = !no_progress;
            if show_progress {
                indicatif_log_bridge::LogWrapper::new(multi.clone(), logger).try_init()?;
            } else {
                let level = logger.filter();
                log::set_boxed_logger(Box::new(logger))?;
                log::set_max_level(level);
            }

            let overrides = ConfigOverrides {
                input: file,
                host,
                workers,
                output,
                timeout_secs: timeout,
                rate_limit: ratelimit,
                name_format: eadname,
                test_limit: test,
                max_retries,
            };
            let config_data = ConfigLoader::resolve(config.as_deref(), overrides)?;

            let fetcher = Arc::new(HttpFetcher::new(config_data.timeout(), &config_data.user_agent)?);
            if !skip_host_check {
                fetcher
                    .check_host(&config_data.host)
                    .await
                    .map_err(|e| anyhow!("{}. Verify that the server is reachable.", e))?;
            }

            let store = DocumentStore::new(config_data.output_dir(), config_data.name_format()?);
            store
                .ensure_dir()
                .with_context(|| format!("creating output directory {}", config_data.output))?;

            let records = limit_records(load_records(&config_data.input)?, config_data.test_limit());
            let total = records.len();

            let engine = FetchEngine::new(
                EngineSettings::from_config(&config_data),
                fetcher,
                store,
                None,
            );

            let mut progress_bar: Option<ProgressBar> = None;
            let mut _progress_task = None;
            if show_progress {
                let pb = multi.add(ProgressBar::new(total as u64));
                pb.set_style(progress::running_style()?);

                let mut metrics_rx = engine.watch_metrics();
                let pb_clone = pb.clone();
                progress_bar = Some(pb);
                _progress_task = Some(tokio::spawn(async move {
                    while metrics_rx.changed().await.is_ok() {
                        let snapshot: MetricsSnapshot = metrics_rx.borrow().clone();
                        pb_clone.set_message(progress::running_message(&snapshot));
                    }
                }));
            }

            let time_start = Instant::now();
            let result = engine.run(records, progress_bar.clone()).await;

            if let Some(task) = _progress_task {
                task.abort();
            }
            let final_metrics = engine.get_metrics();
            if let Some(pb) = progress_bar {
                progress::finish(&pb, &result, &final_metrics)?;
            }

            let rows = result?;
            println!(
                "\nEAD XML fetching completed in {:.1?}.\nWriting report...",
                time_start.elapsed()
            );

            if let Err(e) = write_report(&config_data.output_dir(), &rows) {
                log::error!("Error writing report: {}", e);
                return Err(anyhow!(
                    "Error writing report: {}. EAD files may have been retrieved, \
                     but it may be difficult to determine the completeness of the work without the report. \
                     Consider fixing the underlying issue and running the job again.",
                    e
                ));
            }

            println!("\n✅ Fetch Completed:");
            println!("   Collections: {}", rows.len());
            println!("   Saved: {}", final_metrics.jobs_succeeded);
            println!("   Failed: {}", final_metrics.jobs_failed);
            println!("   Retries: {}", final_metrics.retries);
            println!("   Average Duration: {}ms", final_metrics.avg_response_time_ms);
            println!("   Total Time: {:.1}s", final_metrics.elapsed_seconds);
            println!(
                "\nThe report is now complete. Look for the file '{}' in the {} directory.\n\
                 The last column will contain information about the status of a retrieval.",
                REPORT_FILE_NAME, config_data.output
            );
        }
        Commands::Check { config } => {
            match ConfigLoader::load(&config) {
                Ok(cfg) => {
                    println!("✅ Config is valid:");
                    println!("   Host: {}", cfg.host);
                    println!("   Input: {}", cfg.input);
                    println!("   Output: {}", cfg.output);
                    println!("   Workers: {} | Rate limit: {}/s | Timeout: {}s", cfg.workers, cfg.rate_limit, cfg.timeout_secs);
                    println!("   Max retries: {}", cfg.retry.max_retries);
                }
                Err(e) => {
                    eprintln!("❌ Config error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
