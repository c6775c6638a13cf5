//! Minijinja template rendering for reminder messages.
//!
//! Title and body are arbitrary strings from configuration (not
//! pre-registered files), so a fresh [`minijinja::Environment`] is created
//! per render call.

use crate::traits::NotifyError;

/// Context data available to reminder templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateContext {
    /// The task being reminded about.
    pub task: TaskContext,
    /// Broadcast channel the reminder goes to.
    pub channel: String,
}

/// Task fields exposed to templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskContext {
    pub id: String,
    pub title: String,
    /// Priority label, already defaulted.
    pub priority: String,
    /// Due date as it appears in the message metadata.
    pub due_date: Option<String>,
}

/// Renders reminder templates using minijinja.
#[derive(Debug)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("lower", lower_filter);
        env.add_filter("upper", upper_filter);
        env.add_function("env", env_function);
        env
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, ctx: &TemplateContext) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Check that a template string parses. Does not evaluate it.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template has syntax errors.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn lower_filter(value: String) -> String {
    value.to_lowercase()
}

fn upper_filter(value: String) -> String {
    value.to_uppercase()
}

/// Global function: read an environment variable by name.
///
/// Missing variables render as an empty string (logged at warn).
fn env_function(name: String) -> String {
    match std::env::var(&name) {
        Ok(val) => val,
        Err(_) => {
            tracing::warn!(var = %name, "Environment variable not found, returning empty string");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> TemplateContext {
        TemplateContext {
            task: TaskContext {
                id: "task-42".to_string(),
                title: "Water the <plants>".to_string(),
                priority: "high".to_string(),
                due_date: None,
            },
            channel: "ToDos".to_string(),
        }
    }

    #[test]
    fn render_task_title() {
        let renderer = TemplateRenderer::new();
        let out = renderer
            .render("Time to: {{ task.title }}", &sample_context())
            .unwrap();
        assert_eq!(out, "Time to: Water the <plants>");
    }

    #[test]
    fn render_filters_and_optional_fields() {
        let renderer = TemplateRenderer::new();
        let out = renderer
            .render(
                "[{{ task.priority | upper }}] {{ task.title }}{% if task.due_date %} (due {{ task.due_date }}){% endif %}",
                &sample_context(),
            )
            .unwrap();
        assert_eq!(out, "[HIGH] Water the <plants>");
    }

    #[test]
    fn render_env_missing_returns_empty() {
        let renderer = TemplateRenderer::new();
        let out = renderer
            .render("[{{ env('DUEBELL_DEFINITELY_NOT_SET_XYZ') }}]", &sample_context())
            .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn invalid_template_produces_error() {
        let renderer = TemplateRenderer::new();
        assert!(matches!(
            renderer.render("{{ unclosed", &sample_context()),
            Err(NotifyError::Template(_))
        ));
        assert!(renderer.validate("{{ unclosed").is_err());
        assert!(renderer.validate("Time to: {{ task.title }}").is_ok());
    }
}
