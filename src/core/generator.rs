//! Regeneration of one destination from the current containers.
//!
//! A run filters the containers by liveness and exposure, renders the
//! template, strips blank lines and writes the result. When the destination
//! changed and a notify command is configured, the command runs afterwards.

use std::io::Write;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::core::config::Config;
use crate::core::context::RuntimeContainer;
use crate::core::error::{Error, Result};
use crate::core::templates::Renderer;
use crate::core::utils::remove_blank_lines;
use crate::infrastructure::output::AtomicFileWriter;
use crate::infrastructure::shell::{CommandExecutor, ShellCommandExecutor};

/// Containers selected for rendering by `config`, in source order.
///
/// Stopped containers are dropped unless `include_stopped` is set.
/// `only_published` takes priority over `only_exposed`.
pub fn filter_containers<'a>(
    config: &Config,
    containers: &'a [RuntimeContainer],
) -> Vec<&'a RuntimeContainer> {
    containers
        .iter()
        .filter(|c| config.include_stopped || c.state.running)
        .filter(|c| {
            if config.only_published {
                !c.published_addresses().is_empty()
            } else if config.only_exposed {
                !c.addresses.is_empty()
            } else {
                true
            }
        })
        .collect()
}

/// Renders templates and keeps destinations in sync
pub struct Generator<E = ShellCommandExecutor> {
    renderer: Renderer,
    writer: AtomicFileWriter,
    executor: E,
}

impl Generator {
    pub fn new(renderer: Renderer) -> Self {
        Self::with_executor(renderer, ShellCommandExecutor::new())
    }
}

impl<E: CommandExecutor> Generator<E> {
    pub fn with_executor(renderer: Renderer, executor: E) -> Self {
        Self {
            renderer,
            writer: AtomicFileWriter::new(),
            executor,
        }
    }

    /// Regenerates the destination of `config`, writing to standard output
    /// when it has none. Returns whether the output changed.
    pub fn generate(&self, config: &Config, containers: &[RuntimeContainer]) -> Result<bool> {
        let stdout = std::io::stdout();
        self.generate_to(config, containers, &mut stdout.lock())
    }

    /// Like [`Generator::generate`], with `out` standing in for standard output
    pub fn generate_to<W: Write>(
        &self,
        config: &Config,
        containers: &[RuntimeContainer],
        out: &mut W,
    ) -> Result<bool> {
        let selected: Vec<Value> = filter_containers(config, containers)
            .into_iter()
            .map(RuntimeContainer::to_template_value)
            .collect();

        let rendered = self.renderer.render_values(&config.template, &selected)?;
        let contents = if config.keep_blank_lines {
            rendered
        } else {
            remove_blank_lines(&rendered)
        };

        let Some(dest) = config.dest_path() else {
            out.write_all(contents.as_bytes())?;
            out.flush()?;
            return Ok(true);
        };

        let changed = self.writer.write(dest, contents.as_bytes())?;
        if !changed {
            debug!(dest = %dest.display(), "Destination unchanged");
            return Ok(false);
        }
        info!(
            dest = %dest.display(),
            containers = selected.len(),
            "Generated '{}' from {} containers",
            dest.display(),
            selected.len()
        );

        if let Some(command) = config.notify_cmd.as_deref().filter(|c| !c.trim().is_empty()) {
            self.notify(command)?;
        }
        Ok(true)
    }

    fn notify(&self, command: &str) -> Result<()> {
        info!(command, "Running notify command");
        let result = self.executor.execute(command)?;
        if !result.stdout.is_empty() {
            debug!(command, stdout = %result.stdout.trim_end(), "Notify command output");
        }
        if result.is_success() {
            return Ok(());
        }

        error!(
            command,
            exit_code = result.exit_code,
            stderr = %result.stderr.trim_end(),
            "Notify command failed"
        );
        Err(Error::Notify {
            command: command.to_string(),
            message: format!("exit status {}", result.exit_code),
        })
    }
}
