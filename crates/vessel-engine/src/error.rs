//! Engine error types with operator-facing formatting

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt;
use thiserror::Error;

use crate::suggestions::{
    AVAILABLE_FILTERS, extract_filter_name, extract_function_name, extract_variable_name,
    suggest_undefined_variable, suggest_unknown_filter, suggest_unknown_function,
};

/// Main engine error type
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    DependencyCycle(#[from] DependencyCycle),

    /// A template failed in the resolution pass
    #[error("failed to render {field} of config item '{item}'")]
    #[diagnostic(code(vessel::config::item_render))]
    ItemRender {
        item: String,
        field: ItemField,
        #[source]
        #[diagnostic_source]
        source: TemplateError,
    },

    /// A graph node with no matching schema item
    #[error("config item '{name}' is not declared in the schema")]
    #[diagnostic(code(vessel::config::unknown_item))]
    UnknownItem { name: String },

    #[error("invalid config schema: {0}")]
    #[diagnostic(code(vessel::config::schema))]
    Schema(#[from] vessel_core::CoreError),
}

impl EngineError {
    /// Name of the config item the error is attributed to, if any
    pub fn item(&self) -> Option<&str> {
        match self {
            Self::ItemRender { item, .. } => Some(item),
            Self::UnknownItem { name } => Some(name),
            _ => None,
        }
    }
}

/// Which template of an item is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Default,
    Value,
}

impl ItemField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Value => "value",
        }
    }

    /// Template name used in diagnostics, e.g. `db_host.default`
    pub fn template_name(&self, item: &str) -> String {
        format!("{}.{}", item, self.as_str())
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// No remaining node is free of dependencies
///
/// Either the items form a cycle or an item references a name that never
/// resolves. `waiting` lists every remaining item with the names it still
/// waits on.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("no config options exist with 0 dependencies - {}", waiting_list(.waiting))]
#[diagnostic(
    code(vessel::config::dependency_cycle),
    help("break the cycle, or check that every referenced config item is declared")
)]
pub struct DependencyCycle {
    pub waiting: Vec<(String, Vec<String>)>,
}

impl DependencyCycle {
    /// Names of the blocked items
    pub fn blocked(&self) -> impl Iterator<Item = &str> {
        self.waiting.iter().map(|(name, _)| name.as_str())
    }
}

fn waiting_list(waiting: &[(String, Vec<String>)]) -> String {
    waiting
        .iter()
        .map(|(name, deps)| {
            let deps: Vec<String> = deps.iter().map(|d| format!("{:?}", d)).collect();
            format!("{:?} depends on {}", name, deps.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    SyntaxError,
    TypeError,
    InvalidOperation,
    MissingArgument,
    Other,
}

impl TemplateErrorKind {
    /// Convert to a code string for diagnostics
    pub fn to_code_string(&self) -> &'static str {
        match self {
            Self::UndefinedVariable => "undefined_variable",
            Self::UnknownFilter => "unknown_filter",
            Self::UnknownFunction => "unknown_function",
            Self::SyntaxError => "syntax",
            Self::TypeError => "type",
            Self::InvalidOperation => "invalid_operation",
            Self::MissingArgument => "missing_argument",
            Self::Other => "render",
        }
    }
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(vessel::template::render))]
pub struct TemplateError {
    /// Error message
    pub message: String,

    /// Error kind for categorization
    pub kind: TemplateErrorKind,

    /// Template source code
    #[source_code]
    pub src: NamedSource<String>,

    /// Error location in source
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    /// Suggestion for fixing the error
    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a new template error from a MiniJinja error
    pub fn from_minijinja(err: minijinja::Error, template_name: &str, template_source: &str) -> Self {
        let (kind, message) = categorize_minijinja_error(&err);
        let span = err
            .line()
            .and_then(|line_num| calculate_span(template_source, line_num));
        let suggestion = generate_suggestion(&err, kind);

        Self {
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Categorize a MiniJinja error into our error kinds
fn categorize_minijinja_error(err: &minijinja::Error) -> (TemplateErrorKind, String) {
    let msg = err.to_string();
    let msg_lower = msg.to_lowercase();

    let kind = match err.kind() {
        minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        minijinja::ErrorKind::UnknownFunction => TemplateErrorKind::UnknownFunction,
        minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        minijinja::ErrorKind::MissingArgument => TemplateErrorKind::MissingArgument,
        minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => {
            TemplateErrorKind::TypeError
        }
        _ => {
            if msg_lower.contains("undefined") {
                TemplateErrorKind::UndefinedVariable
            } else if msg_lower.contains("syntax") || msg_lower.contains("expected") {
                TemplateErrorKind::SyntaxError
            } else {
                TemplateErrorKind::Other
            }
        }
    };

    let message = msg
        .replace("invalid operation: ", "")
        .replace("syntax error: ", "")
        .replace("undefined value", "undefined variable");

    (kind, message)
}

/// Calculate the source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (index, line) in source.lines().enumerate() {
        if index + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}

/// Generate suggestions based on error kind
fn generate_suggestion(err: &minijinja::Error, kind: TemplateErrorKind) -> Option<String> {
    let msg = err.to_string();
    let detailed = format!("{:#}", err);

    match kind {
        TemplateErrorKind::UndefinedVariable => extract_variable_name(&detailed)
            .and_then(|name| suggest_undefined_variable(&name))
            .or_else(|| {
                Some(
                    "Config items are not template variables. Read them with `ConfigOption(\"name\")`."
                        .to_string(),
                )
            }),
        TemplateErrorKind::UnknownFunction => extract_function_name(&msg)
            .and_then(|name| suggest_unknown_function(&name))
            .or_else(|| Some("Unknown function. Check the function name and arguments.".to_string())),
        TemplateErrorKind::UnknownFilter => extract_filter_name(&msg)
            .and_then(|name| suggest_unknown_filter(&name))
            .or_else(|| {
                Some(format!(
                    "Unknown filter. Available: {}",
                    AVAILABLE_FILTERS.join(", ")
                ))
            }),
        TemplateErrorKind::SyntaxError => Some(
            "Check bracket matching: `{{ }}` for expressions, `{% %}` for statements, `{# #}` for comments"
                .to_string(),
        ),
        TemplateErrorKind::MissingArgument => Some(
            "ConfigOption, ConfigOptionIndex and ConfigOptionData take an item name; ConfigOptionEquals and ConfigOptionNotEquals also take the value to compare"
                .to_string(),
        ),
        _ => None,
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_span() {
        let source = "line one\nline two\nline three";
        let span = calculate_span(source, 2).unwrap();
        assert_eq!(span.offset(), 9);
        assert_eq!(span.len(), 8);
        assert!(calculate_span(source, 10).is_none());
    }

    #[test]
    fn test_item_field_template_name() {
        assert_eq!(ItemField::Default.template_name("db_host"), "db_host.default");
        assert_eq!(ItemField::Value.to_string(), "value");
    }

    #[test]
    fn test_cycle_blocked_names() {
        let cycle = DependencyCycle {
            waiting: vec![
                ("a".to_string(), vec!["b".to_string(), "c".to_string()]),
                ("b".to_string(), vec!["a".to_string()]),
            ],
        };
        assert_eq!(cycle.blocked().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            cycle.to_string(),
            r#"no config options exist with 0 dependencies - "a" depends on "b", "c"; "b" depends on "a""#
        );
    }

    #[test]
    fn test_item_render_attribution() {
        let err = EngineError::ItemRender {
            item: "db_url".to_string(),
            field: ItemField::Value,
            source: TemplateError::from_minijinja(
                minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, "boom"),
                "db_url.value",
                "{{ x }}",
            ),
        };
        assert_eq!(err.item(), Some("db_url"));
        assert_eq!(
            err.to_string(),
            "failed to render value of config item 'db_url'"
        );
    }

    #[test]
    fn test_template_error_from_minijinja() {
        let env = minijinja::Environment::new();
        let err = env
            .render_str("{{ ConfigOptoin(\"a\") }}", minijinja::context! {})
            .unwrap_err();

        let te = TemplateError::from_minijinja(err, "a.default", "{{ ConfigOptoin(\"a\") }}");
        assert_eq!(te.kind(), TemplateErrorKind::UnknownFunction);
        assert!(te.suggestion.unwrap().contains("ConfigOption"));
    }
}
