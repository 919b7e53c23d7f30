#![allow(clippy::missing_errors_doc)]

use std::io::Read;
use std::sync::Arc;

use clap::Parser;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use lingomark::cli::commands::{Cli, Command};
use lingomark::cli::output::{self, ParsedFile, StreamSummary};
use lingomark::config::{Config, WorkerSettings};
use lingomark::dispatcher::{Dispatcher, FormatEvent};
use lingomark::error::{LingoError, Result};
use lingomark::{parser, worker};

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_cwd()?;
    match cli.command {
        Command::Parse { files } => cmd_parse(&config, &files),
        Command::Format { file, stream, sync } => cmd_format(&config, &file, stream, sync),
        Command::Serve => cmd_serve(&config),
        Command::Config { write } => cmd_config(&config, write),
    }
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| LingoError::Other(format!("cannot read {path}: {e}")))
    }
}

fn cmd_parse(config: &Config, files: &[String]) -> Result<()> {
    let pretty = config.settings.output.is_pretty();
    match files {
        [] => {
            let segments = parser::parse(&read_input("-")?);
            println!("{}", output::render(&segments, pretty));
        }
        [single] => {
            let segments = parser::parse(&read_input(single)?);
            println!("{}", output::render(&segments, pretty));
        }
        many => {
            let parsed = many
                .par_iter()
                .map(|path| -> Result<ParsedFile> {
                    Ok(ParsedFile {
                        path: path.clone(),
                        segments: parser::parse(&read_input(path)?),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            println!("{}", output::render(&parsed, pretty));
        }
    }
    Ok(())
}

fn cmd_format(config: &Config, file: &str, stream: bool, sync: bool) -> Result<()> {
    let content = read_input(file)?;
    let mut settings = config.settings.worker.clone();
    if sync {
        settings.enabled = false;
    }
    let pretty = config.settings.output.is_pretty();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(format_async(content, &settings, stream, pretty))
}

async fn format_async(
    content: String,
    settings: &WorkerSettings,
    stream: bool,
    pretty: bool,
) -> Result<()> {
    let dispatcher = Arc::new(Dispatcher::new(settings));
    if !stream {
        let segments = dispatcher.format(&content, None).await?;
        println!("{}", output::render(&segments, pretty));
        return Ok(());
    }

    let mut events = dispatcher.format_stream(content);
    while let Some(event) = events.recv().await {
        match event {
            FormatEvent::Batch(batch) => println!("{}", output::format_json(&batch)),
            FormatEvent::Done(all) => println!(
                "{}",
                output::format_json(&StreamSummary {
                    done: true,
                    count: all.len(),
                })
            ),
            FormatEvent::Failed(e) => return Err(e),
        }
    }
    Ok(())
}

fn cmd_serve(config: &Config) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    worker::serve(
        stdin.lock(),
        stdout.lock(),
        config.settings.worker.effective_batch_size(),
    )
}

fn cmd_config(config: &Config, write: bool) -> Result<()> {
    if write {
        config.save_settings()?;
    }
    let out = serde_json::json!({
        "path": config.config_path.to_string_lossy(),
        "written": write,
        "settings": config.settings,
    });
    let pretty = config.settings.output.is_pretty();
    println!("{}", output::render(&out, pretty));
    Ok(())
}
