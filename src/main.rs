//! ru-guard 命令行入口
//! detect：输出检测结果；apply：改写HTML文件；scan：统计标记元素

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ru_guard::{
    ConfigOverrides, Detection, FixedTimezone, GuardConfig, HttpGeoClient, MarkerScanner, RuGuard,
    SystemTimezone, TimezoneSource,
};

#[derive(Parser, Debug)]
#[command(name = "ru-guard", version, about = "Visitor region detection and marker-class HTML gating")]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[arg(long, global = true, help = "JSON file with configuration overrides (camelCase keys)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Detection mode: timezone, ip, ip+timezone, ip|timezone")]
    detection: Option<Detection>,
    #[arg(long, global = true, help = "IANA timezone to assume instead of the system one")]
    timezone: Option<String>,
    #[arg(long, global = true, help = "Per-endpoint IP lookup timeout in milliseconds (0 = give up immediately)")]
    ip_timeout: Option<u64>,
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 检测当前访客地区
    Detect,
    /// 检测（或假定）地区后改写HTML文件
    Apply {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        assume: Option<Assume>,
    },
    /// 统计HTML文件中的标记元素
    Scan { input: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Assume {
    Ru,
    Foreign,
}

impl Assume {
    fn is_ru(self) -> bool {
        self == Assume::Ru
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Detect => {
            let guard = build_guard(&cli)?;
            let detection = guard.detect().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&detection)?);
            } else {
                println!("{}", detection);
            }
        }
        Commands::Apply {
            input,
            output,
            assume,
        } => {
            let guard = build_guard(&cli)?;
            let html = read_input(input)?;

            let is_ru = match assume {
                Some(assume) => assume.is_ru(),
                None => guard.detect().await.is_ru,
            };
            debug!("Applying rules to {} with isRu={}", input.display(), is_ru);

            let applied = guard.rewrite_html(is_ru, &html)?;
            match output {
                Some(path) => fs::write(path, &applied.html)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", applied.html),
            }

            if cli.json {
                eprintln!("{}", serde_json::to_string(&applied.counts)?);
            } else {
                eprintln!("isRu={} {}", is_ru, applied.counts);
            }
        }
        Commands::Scan { input } => {
            let html = read_input(input)?;
            let inventory = MarkerScanner::scan(&html);
            if cli.json {
                let counts: serde_json::Map<String, serde_json::Value> = inventory
                    .entries()
                    .into_iter()
                    .map(|(marker, count)| (marker.class_name().to_string(), count.into()))
                    .collect();
                let report = serde_json::json!({
                    "markers": counts,
                    "total": inventory.total(),
                    "autoBootstrap": inventory.auto_bootstrap,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for (marker, count) in inventory.entries() {
                    println!("{:<16} {}", marker.class_name(), count);
                }
                println!("{:<16} {}", "total", inventory.total());
                println!("{:<16} {}", "auto-bootstrap", inventory.auto_bootstrap);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 配置优先级：命令行参数 > 配置文件 > 默认值
fn build_config(cli: &Cli) -> Result<GuardConfig> {
    let mut builder = GuardConfig::builder();
    if let Some(path) = &cli.config {
        let overrides = ConfigOverrides::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        builder = builder.overrides(overrides);
    }
    if let Some(detection) = cli.detection {
        builder = builder.detection(detection);
    }
    if let Some(ms) = cli.ip_timeout {
        builder = builder.ip_timeout(Duration::from_millis(ms));
    }
    Ok(builder.build()?)
}

fn build_guard(cli: &Cli) -> Result<RuGuard> {
    let config = build_config(cli)?;
    let timezone: Arc<dyn TimezoneSource> = match &cli.timezone {
        Some(tz) => Arc::new(FixedTimezone::new(tz.clone())),
        None => Arc::new(SystemTimezone),
    };
    let geo = HttpGeoClient::new()?;
    Ok(RuGuard::with_sources(config, Arc::new(geo), timezone)?)
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
