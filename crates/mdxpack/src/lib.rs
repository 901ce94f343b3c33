//! # mdxpack
//!
//! Bundle one MDX document, plus any in-memory files it imports, into a
//! single self-contained JavaScript string that can later be evaluated with
//! caller-supplied bindings.
//!
//! The heavy lifting is delegated to real tooling: MDX compilation goes
//! through [`mdxjs`] and bundling goes through Rolldown. This crate wires
//! the two together with a virtual file store, front matter extraction,
//! and an IIFE output shape that a client can turn back into a component.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mdxpack::{bundle, BundleOptions, EntrySource};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = r#"---
//! title: Example Post
//! ---
//!
//! import Demo from './demo.tsx'
//!
//! # Hello
//!
//! <Demo />
//! "#;
//!
//! let options = BundleOptions::builder()
//!     .entry(EntrySource::Source(source.to_string()))
//!     .build()
//!     .with_file("./demo.tsx", "export default () => <div>Neat demo</div>");
//!
//! let artifact = bundle(options).await?;
//! println!("{}", artifact.code);
//! # Ok(()) }
//! ```

pub mod artifact;
pub mod bundler;
pub mod diagnostics;
pub mod frontmatter;
pub mod options;
pub mod plugins;
pub mod store;

pub use artifact::BundleArtifact;
pub use bundler::bundle;
pub use frontmatter::{Frontmatter, MatterFile, MatterOptions, MatterValue};
pub use options::{
    BundleOptions, BundlerOverrideFn, EntrySource, GlobalBinding, JsxConfig, MdxOverrideFn,
    MdxSettings,
};
pub use store::VirtualFileStore;

// Re-export the Rolldown option types callers can touch through the
// bundler override pass.
pub use rolldown::{
    BundlerOptions, GlobalsOutputOption, IsExternal, OutputFormat, Platform, RawMinifyOptions,
    ResolveOptions,
};

/// Global variable the IIFE output assigns the module namespace to.
///
/// The artifact wrapper appends `;return Component;` so the bundle text is
/// a complete function body returning this namespace.
pub const GLOBAL_NAME: &str = "Component";

/// Error types for mdxpack operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the Rolldown bundler.
    #[error("Rolldown bundler error: {}", format_bundler_error(.0))]
    Bundler(Vec<diagnostics::BundleDiagnostic>),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Two caller files normalize to the same absolute path.
    #[error("Duplicate virtual file: {0}")]
    DuplicateFile(String),

    /// The leading front matter block could not be parsed.
    #[error("Invalid front matter: {0}")]
    Frontmatter(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for mdxpack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a Rolldown error value.
    pub fn from_bundler(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundler(diagnostics::extract_from_debug(error))
    }
}

/// Format bundler diagnostics for display.
fn format_bundler_error(diagnostics: &[diagnostics::BundleDiagnostic]) -> String {
    if diagnostics.is_empty() {
        return "Unknown bundler error".to_string();
    }

    if diagnostics.len() == 1 {
        diagnostics[0].message.clone()
    } else {
        format!(
            "{} errors: {}",
            diagnostics.len(),
            diagnostics
                .iter()
                .map(|d| d.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        )
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Bundler(_) => "BUNDLER_ERROR",
            Error::Config(_) => "INVALID_CONFIG",
            Error::DuplicateFile(_) => "DUPLICATE_FILE",
            Error::Frontmatter(_) => "INVALID_FRONT_MATTER",
            Error::Io(_) => "IO_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Config(msg) => Some(Box::new(format!(
                "Check the bundle options for inconsistent settings.\nError: {}",
                msg
            ))),
            Error::DuplicateFile(path) => Some(Box::new(format!(
                "Two entries in `files` resolve to '{}'. Remove or rename one of them.",
                path
            ))),
            Error::Frontmatter(msg) => Some(Box::new(format!(
                "The document starts with a front matter block that is not valid YAML.\nError: {}",
                msg
            ))),
            _ => None,
        }
    }
}
