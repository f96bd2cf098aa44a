//! Template rendering primitive based on MiniJinja

use minijinja::value::Rest;
use minijinja::{Environment, UndefinedBehavior, Value, context};

use crate::error::TemplateError;
use crate::functions::FunctionTable;

/// Renders one template string with an explicit function table
///
/// Both passes go through this seam, so tests can substitute their own
/// renderer.
pub trait Render {
    fn render(
        &self,
        name: &str,
        template: &str,
        functions: &FunctionTable,
    ) -> Result<String, TemplateError>;
}

/// Renderer builder
pub struct RendererBuilder {
    strict_mode: bool,
}

impl Default for RendererBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererBuilder {
    pub fn new() -> Self {
        Self { strict_mode: true }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn build(self) -> TemplateRenderer {
        TemplateRenderer::new(self.strict_mode)
    }
}

/// MiniJinja-backed renderer
///
/// A fresh environment is created per call and every entry of the given
/// table is registered as a global function.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    strict_mode: bool,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TemplateRenderer {
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }

    pub fn builder() -> RendererBuilder {
        RendererBuilder::new()
    }

    fn create_environment(&self, functions: &FunctionTable) -> Environment<'static> {
        let mut env = Environment::new();

        if self.strict_mode {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(UndefinedBehavior::Lenient);
        }

        // Values are plain strings, never HTML
        env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);
        env.set_keep_trailing_newline(true);

        for (name, function) in functions.iter() {
            let function = function.clone();
            env.add_function(name.to_string(), move |args: Rest<Value>| function(&args));
        }

        env
    }
}

impl Render for TemplateRenderer {
    fn render(
        &self,
        name: &str,
        template: &str,
        functions: &FunctionTable,
    ) -> Result<String, TemplateError> {
        if template.is_empty() {
            return Ok(String::new());
        }

        let mut env = self.create_environment(functions);
        env.add_template_owned(name.to_string(), template.to_string())
            .map_err(|e| TemplateError::from_minijinja(e, name, template))?;

        let tmpl = env
            .get_template(name)
            .map_err(|e| TemplateError::from_minijinja(e, name, template))?;

        tmpl.render(context! {})
            .map_err(|e| TemplateError::from_minijinja(e, name, template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateErrorKind;

    fn table() -> FunctionTable {
        let mut table = FunctionTable::with_static_functions();
        table.insert("Echo", |args: &[Value]| {
            Ok(args.first().cloned().unwrap_or(Value::from("")))
        });
        table
    }

    #[test]
    fn test_plain_text() {
        let renderer = TemplateRenderer::default();
        let out = renderer.render("a.default", "hello", &table()).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_empty_template() {
        let renderer = TemplateRenderer::default();
        assert_eq!(renderer.render("a.value", "", &table()).unwrap(), "");
    }

    #[test]
    fn test_table_functions_registered() {
        let renderer = TemplateRenderer::default();
        let out = renderer
            .render("a.default", r#"{{ Echo("x") }}-{{ ToUpper("y") }}"#, &table())
            .unwrap();
        assert_eq!(out, "x-Y");
    }

    #[test]
    fn test_no_html_escaping() {
        let renderer = TemplateRenderer::default();
        let out = renderer
            .render("a.html", r#"{{ Echo("<b>&</b>") }}"#, &table())
            .unwrap();
        assert_eq!(out, "<b>&</b>");
    }

    #[test]
    fn test_missing_function_is_error() {
        let renderer = TemplateRenderer::default();
        let err = renderer
            .render("a.default", r#"{{ ConfigOption("b") }}"#, &FunctionTable::new())
            .unwrap_err();
        assert_eq!(err.kind(), TemplateErrorKind::UnknownFunction);
    }

    #[test]
    fn test_strict_undefined() {
        let strict = TemplateRenderer::builder().build();
        let err = strict
            .render("a.default", "{{ missing.attr }}", &table())
            .unwrap_err();
        assert_eq!(err.kind(), TemplateErrorKind::UndefinedVariable);

        let lenient = TemplateRenderer::builder().strict(false).build();
        assert_eq!(
            lenient.render("a.default", "{{ missing }}", &table()).unwrap(),
            ""
        );
    }

    #[test]
    fn test_syntax_error_has_span() {
        let renderer = TemplateRenderer::default();
        let err = renderer
            .render("a.default", "line\n{{ unclosed", &table())
            .unwrap_err();
        assert_eq!(err.kind(), TemplateErrorKind::SyntaxError);
        assert!(err.span.is_some());
    }
}
