use anyhow::Result;
use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use lapp::cli::{self, Command};

/// lapp - Artifact-aware program model builder
///
/// 合并外部静态分析得到的类层级与调用图, 输出按构件归属划分的程序模型
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// trace | debug | info | warn | error (RUST_LOG 可进一步细化)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 输出 JSON 格式 (默认输出人类可读格式)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志 (stderr, stdout 留给输出)
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(cli::log_filter(&args.log_level)?)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    cli::handle_command(args.command, args.json)
}
