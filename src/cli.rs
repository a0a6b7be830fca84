//! CLI 模式处理器
//!
//! 默认输出人类可读格式, 使用 --json 参数可输出 JSON 格式

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::Subcommand;
use rayon::prelude::*;
use serde_json::{json, Value};
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::analysis::AnalysisBundle;
use crate::builder::build_bundle;
use crate::document::PackageDocument;
use crate::outputs::{GraphVizOutput, PackageOutput, UnresolvedCallOutput};
use crate::package::Package;

/// CLI Commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 构建程序模型 - 每个分析包独立构建 (并行)
    Build {
        /// 分析包文件 (.json / .yaml)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// 输出目录
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// 紧凑 JSON (默认缩进)
        #[arg(long)]
        compact: bool,
    },

    /// 列出未解析调用
    Unresolved {
        /// 分析包文件
        input: PathBuf,
    },

    /// 生成 GraphViz DOT
    Dot {
        /// 分析包文件
        input: PathBuf,

        /// 输出文件 (默认 stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 已生成模型的摘要
    Summary {
        /// lapp.json 文件
        package: PathBuf,
    },
}

/// 日志过滤器: --log-level 为默认级别, RUST_LOG 可按模块细化
pub fn log_filter(level: &str) -> Result<EnvFilter> {
    let level = Level::from_str(level.trim()).map_err(|e| anyhow!("Invalid --log-level \"{}\": {}", level, e))?;

    Ok(EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy())
}

/// 处理 CLI 命令
///
/// json_output: 是否输出 JSON 格式（默认 false，输出人类可读格式）
pub fn handle_command(cmd: Command, json_output: bool) -> Result<()> {
    let result = match cmd {
        Command::Build { inputs, output, compact } => build_all(&inputs, &output, !compact, json_output),
        Command::Unresolved { input } => load_and_build(&input)
            .and_then(|package| Ok(json!(UnresolvedCallOutput.render(&package)?))),
        Command::Dot { input, output } => dot(&input, output.as_deref()),
        Command::Summary { package } => summary(&package, json_output),
    };

    match result {
        Ok(value) => {
            if json_output {
                let output = json!({
                    "success": true,
                    "data": value
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_value(&value);
            }
            Ok(())
        }
        Err(e) => {
            if json_output {
                let output = json!({
                    "success": false,
                    "error": format!("{:#}", e)
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
                std::process::exit(1);
            }
            Err(e)
        }
    }
}

/// 打印 Value，智能处理字符串和其他类型
fn print_value(value: &Value) {
    match value {
        Value::String(s) => print!("{s}"),
        _ => println!("{}", serde_json::to_string_pretty(value).unwrap_or_default()),
    }
}

fn load_and_build(input: &Path) -> Result<Package> {
    let bundle = AnalysisBundle::from_path(input)
        .with_context(|| format!("Failed to load analysis bundle {}", input.display()))?;
    build_bundle(&bundle).with_context(|| format!("Failed to build package for {}", input.display()))
}

/// Output file name for a bundle: `<stem>.lapp.json`
fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("package");
    output_dir.join(format!("{stem}.lapp.json"))
}

/// Output paths for every input; two inputs may not share one
fn output_paths(inputs: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    let mut paths = Vec::with_capacity(inputs.len());

    for input in inputs {
        let path = output_path(input, output_dir);
        if let Some(previous) = seen.insert(path.clone(), input.as_path()) {
            bail!(
                "Inputs {} and {} would both be written to {}",
                previous.display(),
                input.display(),
                path.display()
            );
        }
        paths.push(path);
    }
    Ok(paths)
}

/// Each input is an independent build with its own registry and model
fn build_all(inputs: &[PathBuf], output_dir: &Path, pretty: bool, json_output: bool) -> Result<Value> {
    let paths = output_paths(inputs, output_dir)?;

    let reports: Vec<Value> = inputs
        .par_iter()
        .zip(paths.par_iter())
        .map(|(input, path)| -> Result<Value> {
            let package = load_and_build(input)?;

            info!("Write {}", path.display());
            PackageDocument::of(&package)
                .write_to_path(path, pretty)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            Ok(json!({
                "input": input.display().to_string(),
                "output": path.display().to_string(),
                "artifacts": package.artifacts().len(),
                "classes": package.class_records().count(),
                "resolvedCalls": package.resolved_calls().len(),
                "unresolvedCalls": package.unresolved_calls().len(),
            }))
        })
        .collect::<Result<_>>()?;

    if json_output {
        return Ok(Value::Array(reports));
    }

    let mut text = String::new();
    for report in &reports {
        text.push_str(&format!(
            "📦 {} -> {}\n   artifacts: {} | classes: {} | resolved calls: {} | unresolved calls: {}\n",
            report["input"].as_str().unwrap_or_default(),
            report["output"].as_str().unwrap_or_default(),
            report["artifacts"],
            report["classes"],
            report["resolvedCalls"],
            report["unresolvedCalls"],
        ));
    }
    Ok(json!(text))
}

fn dot(input: &Path, output: Option<&Path>) -> Result<Value> {
    let package = load_and_build(input)?;
    let rendered = GraphVizOutput::default().render(&package)?;

    match output {
        Some(path) => {
            std::fs::write(path, &rendered).with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(json!(format!("DOT written to {}\n", path.display())))
        }
        None => Ok(json!(rendered)),
    }
}

fn summary(path: &Path, json_output: bool) -> Result<Value> {
    let document = PackageDocument::from_path(path)?;
    let expected_calls: usize = document.class_records.iter().map(|r| r.expected_calls.len()).sum();

    if json_output {
        return Ok(json!({
            "artifacts": document.artifacts.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
            "classes": document.class_records.len(),
            "expectedCalls": expected_calls,
            "resolvedCalls": document.resolved_calls.len(),
            "unresolvedCalls": document.unresolved_calls.len(),
        }));
    }

    let artifacts: Vec<String> = document.artifacts.iter().map(|a| a.to_string()).collect();
    Ok(json!(format!(
        "📋 Package: {}\n\
        ----------------------------------------\n\
        Artifacts: {}\n\
        Classes: {} | Expected calls: {}\n\
        Resolved calls: {} | Unresolved calls: {}\n",
        path.display(),
        artifacts.join(", "),
        document.class_records.len(),
        expected_calls,
        document.resolved_calls.len(),
        document.unresolved_calls.len(),
    )))
}
