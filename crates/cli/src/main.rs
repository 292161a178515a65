//! # Metric Emitter CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 单点发送与 stdin 管道发送
//! - 配置加载与验证
//! - 退出前尽量投递队列中的数据点

mod cli;
mod commands;
mod error;
mod input;
mod settings;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_pipe, run_send, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let observability = ObservabilityConfig::for_verbosity(cli.verbose, cli.quiet)
        .with_format(cli.log_format.into());
    observability::init_with_config(observability)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Metric Emitter CLI starting"
    );

    let result = match &cli.command {
        Commands::Send(args) => run_send(args).await,
        Commands::Pipe(args) => run_pipe(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

