//! The bundle artifact.

use crate::GLOBAL_NAME;
use crate::diagnostics::BundleDiagnostic;
use crate::frontmatter::{Frontmatter, MatterFile};

/// Result of a successful bundle.
#[derive(Debug, Clone)]
pub struct BundleArtifact {
    /// Executable module text. An IIFE assigns the module namespace to the
    /// well-known global, and the appended `;return Component;` makes the
    /// whole string a function body returning that namespace.
    pub code: String,
    /// Front matter record of the entry document.
    pub frontmatter: Frontmatter,
    /// Full front matter split of the entry document.
    pub matter: MatterFile,
    /// Warnings the bundler emitted.
    pub diagnostics: Vec<BundleDiagnostic>,
    /// Non-entry outputs, prefixed with the public path in file mode.
    pub assets: Vec<String>,
}

/// Append the wrapper that turns bundler output into a function body.
pub(crate) fn wrap(code: String) -> String {
    format!("{code};return {GLOBAL_NAME};")
}
