//! Vessel Engine - dependency-ordered rendering of config templates
//!
//! Item `default` and `value` strings are MiniJinja templates that may look
//! up other items with `ConfigOption("name")` and friends. This crate:
//! - discovers the implicit dependency graph between items
//! - renders items batch by batch in dependency order
//! - reports cycles and template errors with item names and suggestions

pub mod depgraph;
pub mod discovery;
pub mod error;
pub mod functions;
pub mod lookup;
pub mod renderer;
pub mod resolve;
pub mod suggestions;

pub use depgraph::DependencyGraph;
pub use discovery::{CONFIG_FUNCTIONS, discover};
pub use error::{DependencyCycle, EngineError, ItemField, Result, TemplateError, TemplateErrorKind};
pub use functions::{FunctionTable, TemplateFunction};
pub use lookup::ConfigLookup;
pub use renderer::{Render, RendererBuilder, TemplateRenderer};
pub use resolve::{ResolutionReport, ResolvedConfig, ResolvedValue, Resolver, ResolverOptions};
pub use suggestions::{AVAILABLE_FILTERS, AVAILABLE_FUNCTIONS};
