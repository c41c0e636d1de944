use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use simtemp_config::{ConfigError, SimTempConfig};
use simtemp_core::prelude::*;
use simtemp_core::selftest::{default_budget, run_alert_selftest};
use simtemp_telemetry::logging::EventLogger;
use simtemp_telemetry::metrics::MetricsRecorder;
use tracing::{debug, info};
use validator::Validate;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file; defaults to config/simtemp.yaml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub device: DeviceOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct DeviceOverrides {
    #[arg(long, global = true)]
    pub sampling_ms: Option<u32>,
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub threshold_mc: Option<i32>,
    /// normal | noisy | ramp
    #[arg(long, global = true)]
    pub mode: Option<String>,
    #[arg(long, global = true)]
    pub seed: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print delivered samples until the count is reached or Ctrl-C
    Stream(StreamArgs),
    /// Check that alerts reach readers; exit code reflects the result
    Selftest,
    /// Print the effective configuration as YAML
    Config,
    /// Stream a few samples, then print prometheus metrics
    Metrics(MetricsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StreamArgs {
    /// Stop after this many samples
    #[arg(short = 'n', long)]
    pub count: Option<u64>,
    /// Wait on readiness and read without blocking
    #[arg(long)]
    pub nonblock: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[arg(long, default_value_t = 3)]
    pub ticks: u64,
}

pub async fn run_command(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref(), &cli.device)?;

    if let Commands::Config = cli.command {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    EventLogger::init(&config.telemetry.log_level).context("Failed to install logger")?;
    let metrics = MetricsRecorder::new().context("Failed to register metrics")?;
    let settings = config.device.to_settings()?;

    let device = Arc::new(SimTemp::new());
    device.start(settings).context("Failed to start device")?;

    let outcome = match cli.command {
        Commands::Stream(args) => run_stream(&device, args, &metrics).await,
        Commands::Selftest => run_selftest(&device, settings.sampling_ms).await,
        Commands::Metrics(args) => run_metrics(&device, args, &metrics).await,
        Commands::Config => Ok(ExitCode::SUCCESS),
    };

    device.stop();
    outcome
}

fn load_config(path: Option<&Path>, overrides: &DeviceOverrides) -> Result<SimTempConfig> {
    let mut config = match path {
        Some(path) => SimTempConfig::load_from_path(path)?,
        None => SimTempConfig::load()?,
    };

    if let Some(sampling_ms) = overrides.sampling_ms {
        config.device.sampling_ms = sampling_ms;
    }
    if let Some(threshold_mc) = overrides.threshold_mc {
        config.device.threshold_mc = threshold_mc;
    }
    if let Some(mode) = &overrides.mode {
        config.device.mode = mode.clone();
    }
    if overrides.seed.is_some() {
        config.device.seed = overrides.seed;
    }

    config.validate().map_err(ConfigError::from)?;
    Ok(config)
}

async fn run_stream(
    device: &Arc<SimTemp>,
    args: StreamArgs,
    metrics: &MetricsRecorder,
) -> Result<ExitCode> {
    let delivered = if args.nonblock {
        stream_on_readiness(device, args.count, metrics).await?
    } else {
        stream_blocking(device, args.count, metrics).await?
    };
    info!(delivered, "Stream finished");
    Ok(ExitCode::SUCCESS)
}

/// Blocking reads on a worker thread; Ctrl-C cancels the pending read.
async fn stream_blocking(
    device: &Arc<SimTemp>,
    count: Option<u64>,
    metrics: &MetricsRecorder,
) -> Result<u64> {
    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let worker = {
        let device = Arc::clone(device);
        let metrics = metrics.clone();
        let options = ReadOptions::blocking().with_cancel(cancel);
        tokio::task::spawn_blocking(move || -> Result<u64> {
            let mut delivered = 0;
            while count.map_or(true, |limit| delivered < limit) {
                let result = device.read(&options);
                metrics.record_read(&result);
                match result {
                    Ok(sample) => {
                        delivered += 1;
                        print_sample(&sample);
                    }
                    Err(DeviceError::TryAgain | DeviceError::TimedOut) => continue,
                    Err(DeviceError::Interrupted) => {
                        eprintln!("interrupted");
                        break;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Ok(delivered)
        })
    };

    let delivered = worker.await.context("Reader thread panicked")?;
    ctrl_c.abort();
    delivered
}

/// Waits on readiness, then drains with a non-blocking read.
async fn stream_on_readiness(
    device: &Arc<SimTemp>,
    count: Option<u64>,
    metrics: &MetricsRecorder,
) -> Result<u64> {
    let mut delivered = 0;
    while count.map_or(true, |limit| delivered < limit) {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("interrupted");
                break;
            }
            readiness = device.ready() => {
                let readiness = readiness?;
                debug!(?readiness, "Device ready");
                let result = device.read(&ReadOptions::nonblocking());
                metrics.record_read(&result);
                match result {
                    Ok(sample) => {
                        delivered += 1;
                        print_sample(&sample);
                    }
                    Err(DeviceError::WouldBlock) => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }
    Ok(delivered)
}

async fn run_selftest(device: &SimTemp, sampling_ms: u32) -> Result<ExitCode> {
    let report = run_alert_selftest(device, default_budget(sampling_ms)).await?;
    if report.passed() {
        println!("Self-test PASSED ({} alerts)", report.alerts_seen);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Self-test FAILED ({} alerts)", report.alerts_seen);
        Ok(ExitCode::FAILURE)
    }
}

async fn run_metrics(
    device: &Arc<SimTemp>,
    args: MetricsArgs,
    metrics: &MetricsRecorder,
) -> Result<ExitCode> {
    stream_blocking(device, Some(args.ticks), metrics).await?;
    metrics.observe_stats(&device.stats()?);
    print!("{}", metrics.gather_metrics()?);
    Ok(ExitCode::SUCCESS)
}

fn print_sample(sample: &Sample) {
    EventLogger::log_sample(sample);
    println!(
        "{}ns temp={:.3}C alert={} flags={:?}",
        sample.timestamp_ns(),
        f64::from(sample.temp_mc()) / 1000.0,
        u8::from(sample.is_alert()),
        sample.flags()
    );
}
