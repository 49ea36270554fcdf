//! docker-gen CLI entrypoint
//! Parses command-line arguments, loads containers and regenerates every configured destination.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use dockergen::core::templates::Renderer;
use dockergen::core::{Config, ConfigFile, Generator, RuntimeContainer};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docker-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file with one or more [[config]] sections (repeatable)
    #[arg(long = "config", value_name = "FILE")]
    configs: Vec<PathBuf>,

    /// JSON array of containers to render; `-` reads standard input
    #[arg(long, value_name = "FILE", default_value = "-")]
    containers: String,

    /// Only include containers with exposed ports
    #[arg(long)]
    only_exposed: bool,

    /// Only include containers with published ports (implies exposed)
    #[arg(long)]
    only_published: bool,

    /// Include stopped containers
    #[arg(long)]
    include_stopped: bool,

    /// Keep blank lines in the output file
    #[arg(long)]
    keep_blank_lines: bool,

    /// Run a command after the destination changed
    #[arg(long = "notify", value_name = "CMD")]
    notify_cmd: Option<String>,

    /// Template to render
    template: Option<PathBuf>,

    /// Destination file; standard output when omitted
    dest: Option<PathBuf>,
}

impl Cli {
    /// Configs from every config file, then the one described by the flags
    fn configs(&self) -> anyhow::Result<Vec<Config>> {
        let mut configs = Vec::new();
        for path in &self.configs {
            let file = ConfigFile::load(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            configs.extend(file.config);
        }

        if let Some(template) = &self.template {
            configs.push(Config {
                template: template.clone(),
                dest: self.dest.clone(),
                include_stopped: self.include_stopped,
                only_published: self.only_published,
                only_exposed: self.only_exposed,
                keep_blank_lines: self.keep_blank_lines,
                notify_cmd: self.notify_cmd.clone(),
            });
        }

        if configs.is_empty() {
            anyhow::bail!("No template given: pass TEMPLATE or --config FILE");
        }
        Ok(configs)
    }
}

fn read_containers(source: &str) -> anyhow::Result<Vec<RuntimeContainer>> {
    let text = if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read containers from standard input")?;
        text
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read containers from {source}"))?
    };

    RuntimeContainer::parse_list(&text).context("Failed to parse containers")
}

/// `RUST_LOG` when set and valid, INFO otherwise
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr; stdout carries rendered output
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let configs = cli.configs()?;
    let containers = read_containers(&cli.containers)?;
    info!(
        containers = containers.len(),
        configs = configs.len(),
        "Loaded containers"
    );

    let generator = Generator::new(Renderer::default());
    let mut failed = 0;
    for config in &configs {
        if let Err(e) = generator.generate(config, &containers) {
            error!(template = %config.template.display(), "{e}");
            failed += 1;
        }
    }

    if failed > 0 {
        error!(failed, total = configs.len(), "Some destinations were not generated");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
