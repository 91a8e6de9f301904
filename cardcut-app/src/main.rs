use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cardcut_config::{AppConfig, ConfigError};
use cardcut_frontend::LayoutArgs;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "cardcut", about = "Lay out card sheets and emit cut files")]
struct Cli {
    /// Configuration file (defaults to $CARDCUT_CONFIG or ./config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lay out a resolved JSON decklist and write the cut file
    Layout {
        /// Decklist JSON file
        decklist: PathBuf,

        /// Cutting machine id
        #[arg(long)]
        machine: Option<String>,

        /// Paper size key (letter, a4)
        #[arg(long)]
        paper: Option<String>,

        /// Card type key (defaults to the game's card type)
        #[arg(long)]
        card_type: Option<String>,

        /// Keep the bottom-left cell free of cards
        #[arg(long, overrides_with = "no_sensor_safe")]
        sensor_safe: bool,

        /// Allow cards in the bottom-left cell even if the config enables sensor-safe
        #[arg(long, overrides_with = "sensor_safe")]
        no_sensor_safe: bool,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List registered cutting machines
    Machines,
    /// Summarise an existing DXF cut file
    Inspect {
        /// DXF file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!(error = %err, "命令执行失败");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let (config, discovery_error) = load_configuration(cli.config)?;
    init_logging(&config);
    if let Some(err) = discovery_error {
        match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
            }
            ConfigError::Context { .. } => {
                warn!(error = %err, "加载默认配置失败，使用内建默认值");
            }
        }
    }
    info!("启动 cardcut");

    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Layout {
            decklist,
            machine,
            paper,
            card_type,
            sensor_safe,
            no_sensor_safe,
            output,
        } => {
            let args = LayoutArgs {
                decklist,
                machine,
                paper,
                card_type,
                sensor_safe: sensor_flag(sensor_safe, no_sensor_safe),
                output,
            };
            cardcut_frontend::run_layout(&config, &args, &mut stdout)
                .with_context(|| format!("排版 {} 失败", args.decklist.display()))?;
        }
        Command::Machines => cardcut_frontend::list_machines(&mut stdout)?,
        Command::Inspect { file } => cardcut_frontend::run_inspect(&file, &mut stdout)
            .with_context(|| format!("检查 {} 失败", file.display()))?,
    }
    Ok(())
}

/// 两个开关互相覆盖，最后出现的生效；都未给出时沿用配置。
fn sensor_flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// 显式指定的配置必须可用；自动发现失败时退回默认配置，并把错误交给调用方记录。
fn load_configuration(
    override_path: Option<PathBuf>,
) -> Result<(AppConfig, Option<ConfigError>)> {
    match override_path {
        Some(path) => {
            let config = AppConfig::from_file(&path)
                .with_context(|| format!("加载配置 {} 失败", path.display()))?;
            Ok((config, None))
        }
        None => match AppConfig::discover() {
            Ok(cfg) => Ok((cfg, None)),
            Err(err) => Ok((AppConfig::default(), Some(err))),
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
