//! # Deck CLI
//!
//! 在模拟设备服务上驱动一个完整的跑步机会话，并管理配置文件。
//!
//! ```bash
//! # 生成默认配置
//! deck-cli config init
//!
//! # 以 90 Hz 运行 10 秒，手动速度 (0.5, 0.0)
//! deck-cli simulate --seconds 10 --rate-hz 90 --speed 0.5 0.0
//!
//! # 服务不可达时观察慢速重连
//! RUST_LOG=deck_driver=debug deck-cli simulate --unreachable
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, SimulateCommand};

/// Deck CLI - 跑步机会话命令行工具
#[derive(Parser, Debug)]
#[command(name = "deck-cli")]
#[command(about = "Command-line driver for treadmill device sessions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 在模拟设备上运行会话
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },
}

/// 未设置 `RUST_LOG` 时的日志过滤
const DEFAULT_LOG_FILTER: &str = "deck_cli=info,deck_driver=info";

/// 构造日志过滤器
///
/// `RUST_LOG` 存在且可解析时完全按它过滤，否则使用 [`DEFAULT_LOG_FILTER`]。
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    // 初始化日志
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Simulate { args } => args.execute(),
    }
}
