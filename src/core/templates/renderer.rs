//! Tera-based template renderer

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tera::{Context, Tera};
use tracing::debug;

use super::functions::FunctionRegistry;
use crate::core::context::RuntimeContainer;
use crate::core::error::{Error, Result};

/// Renders a template file against a list of containers
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: FunctionRegistry,
}

impl Renderer {
    pub fn new(registry: FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Parses the template at `template` and executes it.
    ///
    /// The context holds `containers`, one value per container including its
    /// `PublishedAddresses`, and `env`, the environment of this process.
    pub fn render(&self, template: &Path, containers: &[RuntimeContainer]) -> Result<String> {
        let values: Vec<Value> = containers
            .iter()
            .map(RuntimeContainer::to_template_value)
            .collect();
        self.render_values(template, &values)
    }

    /// Like [`Renderer::render`], for records that are already template values
    pub fn render_values(&self, template: &Path, containers: &[Value]) -> Result<String> {
        let name = template
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| template.to_string_lossy().into_owned());

        // A fresh instance per render keeps templates from leaking between configs
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        self.registry.install(&mut tera);
        tera.add_template_file(template, Some(name.as_str()))
            .map_err(|e| Error::render(template, &e))?;

        let mut context = Context::new();
        context.insert("containers", containers);
        context.insert("env", &environment());

        debug!(template = %template.display(), containers = containers.len(), "Rendering template");
        tera.render(&name, &context)
            .map_err(|e| Error::render(template, &e))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(FunctionRegistry::standard())
    }
}

fn environment() -> BTreeMap<String, String> {
    std::env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_template(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn container(id: &str, host: &str) -> RuntimeContainer {
        RuntimeContainer {
            id: id.to_string(),
            env: BTreeMap::from([("VIRTUAL_HOST".to_string(), host.to_string())]),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_containers() {
        let dir = TempDir::new().unwrap();
        let template = write_template(
            &dir,
            "hosts.tmpl",
            "{% for host, group in groupBy(entries=containers, key=\"Env.VIRTUAL_HOST\") %}\
             {{ host }}:{% for c in group %}{{ c.ID }}{% endfor %}\n{% endfor %}",
        );

        let output = Renderer::default()
            .render(
                &template,
                &[container("1", "a"), container("2", "a"), container("3", "b")],
            )
            .unwrap();
        assert_eq!(output, "a:12\nb:3\n");
    }

    #[test]
    fn test_output_is_not_escaped() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir, "raw.tmpl", "{{ containers[0].Env.VIRTUAL_HOST }}");
        let output = Renderer::default()
            .render(&template, &[container("1", "<a&b>")])
            .unwrap();
        assert_eq!(output, "<a&b>");
    }

    #[test]
    fn test_env_is_available() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir, "env.tmpl", "{{ env.PATH | length > 0 }}");
        let output = Renderer::default().render(&template, &[]).unwrap();
        assert_eq!(output, "true");
    }

    #[test]
    fn test_parse_error_is_returned() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir, "broken.tmpl", "{% for c in containers %}");
        let err = Renderer::default().render(&template, &[]).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
        assert!(err.to_string().contains("broken.tmpl"));
    }

    #[test]
    fn test_execution_error_is_returned() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir, "bad.tmpl", "{{ last(input=[]) }}");
        let err = Renderer::default().render(&template, &[]).unwrap_err();
        assert!(err.to_string().contains("cannot call 'last' on an empty array"));
    }

    #[test]
    fn test_missing_template_is_returned() {
        let err = Renderer::default()
            .render(Path::new("/does/not/exist.tmpl"), &[])
            .unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }
}
