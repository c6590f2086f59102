//! univers-jobs - 端末からジョブを開始・監視する CLI

mod console;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};

use univers_jobs_core::config::Config;
use univers_jobs_core::domain::JobListQuery;
use univers_jobs_core::impls::{ChannelObserver, HttpJobApi};
use univers_jobs_core::ports::{JobParams, NoticeKind};
use univers_jobs_core::{
    JobHandle, JobPoller, LoggerConfig, LoggerFormat, PollEvent, UiJob, logger_init,
    run_job_with_ui,
};

use crate::console::{ConsoleNotifier, ConsoleStatus, ConsoleTrigger};

#[derive(Parser, Debug)]
#[command(name = "univers-jobs")]
#[command(version)]
#[command(about = "Start and watch long-running generation jobs")]
#[command(propagate_version = true)]
struct Cli {
    /// API base URL (overrides UNIVERS_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Delay between status checks in milliseconds (overrides UNIVERS_POLL_INTERVAL_MS)
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Log filter directive, e.g. `info` or `univers_jobs_core=debug`
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a job and follow it until it finishes
    Run {
        /// Endpoint path below the API base, e.g. /generate/ocean/images
        endpoint: String,

        /// Job parameter as key=value; JSON values are accepted
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,

        /// Message shown when the job completes
        #[arg(long, default_value = univers_jobs_core::app::DEFAULT_SUCCESS_MESSAGE)]
        success_message: String,
    },

    /// Follow an already started job
    Watch { job_id: String },

    /// Print the current status of a job as JSON
    Status { job_id: String },

    /// List recent jobs
    List {
        #[arg(long)]
        universe: Option<String>,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Delete finished jobs older than the given age
    Cleanup {
        #[arg(long, default_value_t = 24)]
        max_age_hours: u32,
    },
}

/// `key=value`; the value is JSON if it parses, otherwise a plain string.
fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().context("reading environment")?;
    if let Some(base) = &cli.api_base {
        config.api = config.api.with_base_url(base);
    }
    if let Some(ms) = cli.interval_ms {
        if ms == 0 {
            return Err(anyhow!("--interval-ms must be greater than zero"));
        }
        config.poll.interval = Duration::from_millis(ms);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logger = LoggerConfig {
        format: match cli.log_format.parse::<LoggerFormat>() {
            Ok(format) => format,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::from(2);
            }
        },
        level: cli.log_level.clone(),
        ..LoggerConfig::default()
    };
    if let Err(err) = logger_init(&logger) {
        eprintln!("{err}");
        return ExitCode::from(2);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    debug!(base = %config.api.base_url, interval = ?config.poll.interval, "config loaded");

    let api = HttpJobApi::new(&config.api).context("building API client")?;
    let poller = JobPoller::create(Arc::new(api), config.poll.clone());

    let code = match cli.command {
        Command::Run {
            endpoint,
            params,
            success_message,
        } => run_job(&poller, endpoint, params, success_message).await?,
        Command::Watch { job_id } => watch_job(&poller, JobHandle::new(job_id)).await?,
        Command::Status { job_id } => {
            let record = poller.job_status(&JobHandle::new(job_id)).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            ExitCode::SUCCESS
        }
        Command::List { universe, limit } => {
            let mut query = match universe {
                Some(universe) => JobListQuery::universe(universe),
                None => JobListQuery::all(),
            };
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            let list = poller.list_jobs(&query).await?;
            for job in &list.jobs {
                println!(
                    "{:<38} {:<10} {:<12} {}",
                    job.id.as_ref().map(JobHandle::as_str).unwrap_or("-"),
                    job.status,
                    job.universe.as_deref().unwrap_or("-"),
                    job.label(),
                );
            }
            println!("{} jobs, {} active", list.total(), list.active);
            ExitCode::SUCCESS
        }
        Command::Cleanup { max_age_hours } => {
            println!("{}", poller.cleanup_jobs(max_age_hours).await?);
            ExitCode::SUCCESS
        }
    };

    poller.dispose();
    Ok(code)
}

async fn run_job(
    poller: &JobPoller,
    endpoint: String,
    params: Vec<(String, Value)>,
    success_message: String,
) -> Result<ExitCode> {
    let params: JobParams = params.into_iter().collect();
    let (notifier, mut notices) = ConsoleNotifier::channel();
    let job = UiJob::new(endpoint)
        .params(params)
        .trigger(Arc::new(ConsoleTrigger::new("run")))
        .status_display(Arc::new(ConsoleStatus::default()))
        .success_message(success_message)
        .on_complete(|result| {
            if let Some(result) = result {
                println!("{result}");
            }
        });

    let handle = match run_job_with_ui(poller, Arc::new(notifier), job).await {
        Ok(handle) => handle,
        // already reported through the notifier
        Err(_) => return Ok(ExitCode::FAILURE),
    };
    info!(%handle, "following job");

    tokio::select! {
        notice = notices.recv() => Ok(match notice {
            Some(NoticeKind::Success) => ExitCode::SUCCESS,
            _ => ExitCode::FAILURE,
        }),
        _ = tokio::signal::ctrl_c() => {
            info!(%handle, "interrupted, stopping");
            poller.dispose();
            Ok(ExitCode::from(130))
        }
    }
}

async fn watch_job(poller: &JobPoller, handle: JobHandle) -> Result<ExitCode> {
    let (observer, mut events) = ChannelObserver::channel();
    poller.poll_job(handle.clone(), observer);

    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                info!(%handle, "interrupted, stopping");
                poller.dispose();
                return Ok(ExitCode::from(130));
            }
        };
        match event {
            Some(PollEvent::Update(record)) => eprintln!("⏳ {}", record.label()),
            Some(PollEvent::Completed(result)) => {
                eprintln!("✅ {handle} completed");
                if let Some(result) = result {
                    println!("{result}");
                }
                return Ok(ExitCode::SUCCESS);
            }
            Some(PollEvent::Failed(message)) => {
                eprintln!("❌ {message}");
                return Ok(ExitCode::FAILURE);
            }
            None => return Ok(ExitCode::FAILURE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_accept_json_or_plain_strings() {
        assert_eq!(parse_param("count=3").unwrap(), ("count".to_string(), json!(3)));
        assert_eq!(
            parse_param("theme=ocean").unwrap(),
            ("theme".to_string(), json!("ocean"))
        );
        assert_eq!(
            parse_param("tags=[\"a\",\"b\"]").unwrap(),
            ("tags".to_string(), json!(["a", "b"]))
        );
        assert_eq!(
            parse_param("prompt=a=b").unwrap(),
            ("prompt".to_string(), json!("a=b"))
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from([
            "univers-jobs",
            "--api-base",
            "http://example.test/api/",
            "--interval-ms",
            "250",
            "status",
            "abc",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.api.base_url, "http://example.test/api");
        assert_eq!(config.poll.interval, Duration::from_millis(250));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cli = Cli::parse_from(["univers-jobs", "--interval-ms", "0", "list"]);
        assert!(load_config(&cli).is_err());
    }
}
