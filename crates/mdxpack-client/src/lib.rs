//! # mdxpack-client
//!
//! Turn an mdxpack bundle artifact back into a callable component.
//!
//! A bundle artifact is a complete JavaScript function body ending in
//! `return Component;`. Loading wraps it in a function whose parameter
//! names are the caller's scope bindings, evaluates that function in an
//! embedded engine, and invokes it with the bound values. The returned
//! namespace carries the default export (the component) and any named
//! exports, including `frontmatter`.
//!
//! ## Trust boundary
//!
//! There is no sandboxing. The artifact runs with full access to whatever
//! the engine context exposes. Only load code you bundled yourself.
//!
//! ## Example
//!
//! ```no_run
//! use mdxpack_client::ComponentLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = "var Component = { default: 42 };return Component;";
//!
//! let mut loader = ComponentLoader::new();
//! let module = loader.load(code, Vec::new())?;
//! let component = loader.default_export(&module)?;
//! assert_eq!(component.as_number(), Some(42.0));
//! # Ok(()) }
//! ```

use boa_engine::{Context, JsString, JsValue, Source};

/// Error types for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A scope binding name is not usable as a function parameter.
    #[error("Invalid scope binding name: {0:?}")]
    Scope(String),

    /// The artifact threw or failed to evaluate. The engine's message is
    /// passed through unchanged.
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Scope(_) => "INVALID_SCOPE_BINDING",
            Error::Evaluation(_) => "EVALUATION_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Scope(name) => Some(Box::new(format!(
                "Scope binding names become function parameters; {:?} is not a valid JavaScript identifier.",
                name
            ))),
            Error::Evaluation(_) => None,
        }
    }
}

/// A loaded module namespace.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    namespace: JsValue,
}

impl LoadedModule {
    /// The raw namespace value.
    pub fn namespace(&self) -> &JsValue {
        &self.namespace
    }
}

/// Evaluates bundle artifacts in an embedded JavaScript engine.
///
/// The loader owns the engine context; values built against it (via
/// [`ComponentLoader::eval`]) can be passed back in as scope bindings.
pub struct ComponentLoader {
    context: Context,
}

impl Default for ComponentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentLoader {
    pub fn new() -> Self {
        Self {
            context: Context::default(),
        }
    }

    /// Direct access to the engine context, for building scope values.
    pub fn context(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Evaluate a JavaScript expression and return its value. Handy for
    /// constructing scope bindings (`loader.eval("({pad: s => s})")`).
    pub fn eval(&mut self, source: &str) -> Result<JsValue> {
        self.context
            .eval(Source::from_bytes(source.as_bytes()))
            .map_err(|e| Error::Evaluation(e.to_string()))
    }

    /// Load an artifact with the given scope bindings.
    ///
    /// Binding names become the parameter names of the synthesized
    /// function; binding values are the arguments it is invoked with. The
    /// bundle's externalized globals (`_jsx_runtime` and friends) must all
    /// be present in the scope or evaluation will fail.
    pub fn load(&mut self, code: &str, scope: Vec<(String, JsValue)>) -> Result<LoadedModule> {
        for (name, _) in &scope {
            ensure_identifier(name)?;
        }

        let params = scope
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let wrapper = format!("(function({params}) {{\n{code}\n}})");

        let factory = self
            .context
            .eval(Source::from_bytes(wrapper.as_bytes()))
            .map_err(|e| Error::Evaluation(e.to_string()))?;

        let callable = factory
            .as_object()
            .cloned()
            .filter(|obj| obj.is_callable())
            .ok_or_else(|| {
                Error::Evaluation("artifact wrapper did not evaluate to a function".to_string())
            })?;

        let args: Vec<JsValue> = scope.into_iter().map(|(_, value)| value).collect();
        let namespace = callable
            .call(&JsValue::undefined(), &args, &mut self.context)
            .map_err(|e| Error::Evaluation(e.to_string()))?;

        tracing::debug!(bindings = args.len(), "artifact loaded");

        Ok(LoadedModule { namespace })
    }

    /// The module's default export, usually the component itself.
    pub fn default_export(&mut self, module: &LoadedModule) -> Result<JsValue> {
        self.export(module, "default")
    }

    /// A named export of the module.
    pub fn export(&mut self, module: &LoadedModule, name: &str) -> Result<JsValue> {
        let object = module.namespace.as_object().ok_or_else(|| {
            Error::Evaluation("artifact did not return a module namespace object".to_string())
        })?;
        object
            .get(JsString::from(name), &mut self.context)
            .map_err(|e| Error::Evaluation(e.to_string()))
    }

    /// Call a function value with the given arguments.
    pub fn call(&mut self, function: &JsValue, args: &[JsValue]) -> Result<JsValue> {
        let callable = function
            .as_object()
            .cloned()
            .filter(|obj| obj.is_callable())
            .ok_or_else(|| Error::Evaluation("value is not callable".to_string()))?;
        callable
            .call(&JsValue::undefined(), args, &mut self.context)
            .map_err(|e| Error::Evaluation(e.to_string()))
    }
}

fn ensure_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_first = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');

    if valid_first && valid_rest {
        Ok(())
    } else {
        Err(Error::Scope(name.to_string()))
    }
}
