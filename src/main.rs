use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser as _;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use dictsql::{Config, Mode, Parser};

/// 把 JSON 请求编译为参数化的 MySQL 语句
#[derive(clap::Parser)]
#[command(name = "dictsql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON 配置文件
    #[arg(short, long, env = "DICTSQL_CONFIG", default_value = "dictsql.json")]
    config: PathBuf,

    /// 只输出内联参数后的SQL
    #[arg(short, long)]
    render: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,

    /// 请求文件, 每行一个JSON请求; 省略时进入交互模式
    requests: Option<PathBuf>,
}

/// 加载配置，失败时使用默认配置
fn load_config(path: &Path) -> Config {
    match Config::from_json_file(path) {
        Ok(config) => {
            info!(path = %path.display(), "loaded config");
            config
        }
        Err(e) => {
            warn!("{e}, using defaults");
            Config::default()
        }
    }
}

/// 编译一行请求并打印结果
fn compile_line(parser: &Parser<'_>, mode: Mode, line: &str) -> dictsql::Result<()> {
    let statement = parser.parse_str(line)?.compile()?;
    match mode {
        Mode::RenderOnly => println!("{}", statement.render()),
        Mode::Execute => {
            println!("{}", statement.sql);
            println!("-- args: {:?}", statement.values);
        }
    }
    Ok(())
}

fn run_file(parser: &Parser<'_>, mode: Mode, path: &Path) -> anyhow::Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取请求文件 {}", path.display()))?;
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        compile_line(parser, mode, line).with_context(|| format!("第 {} 行", number + 1))?;
    }
    Ok(())
}

fn run_repl(parser: &Parser<'_>, mode: Mode) -> anyhow::Result<()> {
    println!("dictsql ({})", env!("CARGO_PKG_VERSION"));
    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                if let Err(e) = compile_line(parser, mode, &line) {
                    println!("ERROR: {e}");
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli.config);
    let mode = if cli.render { Mode::RenderOnly } else { config.mode };
    let parser = Parser::new(&config);

    match &cli.requests {
        Some(path) => run_file(&parser, mode, path),
        None => run_repl(&parser, mode),
    }
}
