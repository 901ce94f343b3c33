//! Caller-facing configuration for the bundle operation.

use bon::Builder;
use std::path::PathBuf;
use std::sync::Arc;

use crate::frontmatter::{Frontmatter, MatterOptions};
use crate::{Error, Result};

/// Default extension probe order for extensionless imports resolved against
/// the virtual file store, and for Rolldown's own resolution of real files.
pub const DEFAULT_EXTENSION_ORDER: [&str; 6] = [".js", ".ts", ".jsx", ".tsx", ".json", ".mdx"];

/// Fixed message for an inconsistent file-output pair.
pub const OUTPUT_PAIR_MESSAGE: &str =
    "When using `output_dir` or `public_path` the other must be set.";

/// Maximum length of a caller-supplied virtual file path.
pub const MAX_FILE_PATH_LEN: usize = 4096;

/// Maximum size of a caller-supplied virtual file, in bytes.
pub const MAX_FILE_SIZE: usize = 1024 * 1024;

/// Where the entry MDX document comes from.
#[derive(Debug, Clone)]
pub enum EntrySource {
    /// Literal MDX text. The entry is stored under a unique generated path
    /// token so it can never collide with a caller file.
    Source(String),
    /// A real file on disk. Relative imports resolve against its directory
    /// unless an explicit `cwd` is set.
    File(PathBuf),
    /// Literal text with a declared path, so relative imports resolve
    /// against the declared location.
    Document { path: PathBuf, text: String },
}

/// A module specifier the bundler leaves external, bound to a global
/// variable name the loaded artifact expects at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalBinding {
    pub specifier: String,
    pub var_name: String,
}

impl GlobalBinding {
    pub fn new(specifier: impl Into<String>, var_name: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            var_name: var_name.into(),
        }
    }
}

/// Package names and global variable names for the JSX stack.
///
/// These modules are always externalized; the loader supplies them as scope
/// bindings under the configured variable names.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct JsxConfig {
    #[builder(default = String::from("react"))]
    pub jsx_library: String,
    #[builder(default = String::from("React"))]
    pub jsx_library_var: String,
    #[builder(default = String::from("react-dom"))]
    pub dom_library: String,
    #[builder(default = String::from("ReactDOM"))]
    pub dom_library_var: String,
    #[builder(default = String::from("react/jsx-runtime"))]
    pub jsx_runtime: String,
    #[builder(default = String::from("_jsx_runtime"))]
    pub jsx_runtime_var: String,
}

impl Default for JsxConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl JsxConfig {
    /// The three bindings implied by this configuration.
    pub fn bindings(&self) -> Vec<GlobalBinding> {
        vec![
            GlobalBinding::new(&self.jsx_library, &self.jsx_library_var),
            GlobalBinding::new(&self.dom_library, &self.dom_library_var),
            GlobalBinding::new(&self.jsx_runtime, &self.jsx_runtime_var),
        ]
    }
}

/// Settings handed to the MDX compiler for each `.mdx` file.
///
/// The pipeline builds one of these per file and runs the caller's
/// [`MdxOverrideFn`] on it with the file's front matter in view.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct MdxSettings {
    /// Enable GFM (tables, strikethrough, task lists).
    #[builder(default = true)]
    pub gfm: bool,
    /// Emit development-mode output with extra diagnostics.
    #[builder(default)]
    pub development: bool,
    /// Import source for the automatic JSX runtime.
    pub jsx_import_source: Option<String>,
    /// Module providing MDX components at runtime (`useMDXComponents`).
    pub provider_import_source: Option<String>,
}

impl Default for MdxSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MdxSettings {
    /// Build the compiler options for one file.
    pub(crate) fn to_compiler_options(&self, filepath: &str) -> mdxjs::Options {
        let mut opts = if self.gfm {
            mdxjs::Options::gfm()
        } else {
            mdxjs::Options::default()
        };
        opts.development = self.development;
        opts.filepath = Some(filepath.to_string());
        opts.jsx_import_source = self.jsx_import_source.clone();
        opts.provider_import_source = self.provider_import_source.clone();
        opts
    }
}

/// Override pass over the per-file MDX settings.
pub type MdxOverrideFn = dyn Fn(MdxSettings, &Frontmatter) -> MdxSettings + Send + Sync;

/// Override pass over the assembled Rolldown options, applied last before
/// the bundler is invoked.
pub type BundlerOverrideFn =
    dyn Fn(rolldown::BundlerOptions, &Frontmatter) -> rolldown::BundlerOptions + Send + Sync;

/// Options for [`crate::bundle`].
#[derive(Builder)]
#[builder(on(String, into))]
pub struct BundleOptions {
    /// The MDX document to bundle.
    pub entry: EntrySource,

    /// Caller-relative path to contents, for every file the document
    /// imports that does not exist on disk. Paths are joined against the
    /// working directory; two entries resolving to the same path is an
    /// error.
    #[builder(default)]
    pub files: Vec<(String, String)>,

    /// Working directory virtual paths are joined against. Defaults to the
    /// process working directory joined with a fake directory name, or the
    /// entry file's directory when the entry is [`EntrySource::File`].
    pub cwd: Option<PathBuf>,

    /// JSX stack packages and their global variable names.
    #[builder(default)]
    pub jsx: JsxConfig,

    /// Extra externalized modules bound to global variables.
    #[builder(default)]
    pub globals: Vec<GlobalBinding>,

    /// Extension probe order for extensionless imports.
    #[builder(default = DEFAULT_EXTENSION_ORDER.iter().map(|s| s.to_string()).collect())]
    pub extension_probe_order: Vec<String>,

    /// Minify the output. On by default.
    #[builder(default = true)]
    pub minify: bool,

    /// Value injected for `process.env.NODE_ENV` at compile time.
    #[builder(default = String::from("production"))]
    pub environment_mode: String,

    /// Directory the bundler writes chunks to in file mode. Must be paired
    /// with `public_path`.
    pub output_dir: Option<PathBuf>,

    /// Public URL prefix reported for non-entry assets in file mode. Must
    /// be paired with `output_dir`.
    pub public_path: Option<String>,

    /// Front matter extraction settings.
    #[builder(default)]
    pub matter: MatterOptions,

    /// Per-file MDX settings override pass.
    pub mdx_overrides: Option<Arc<MdxOverrideFn>>,

    /// Final Rolldown options override pass.
    pub bundler_overrides: Option<Arc<BundlerOverrideFn>>,
}

impl BundleOptions {
    /// Add one virtual file.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.push((path.into(), contents.into()));
        self
    }

    /// Externalize `specifier`, binding it to the global `var_name`.
    pub fn with_global(
        mut self,
        specifier: impl Into<String>,
        var_name: impl Into<String>,
    ) -> Self {
        self.globals.push(GlobalBinding::new(specifier, var_name));
        self
    }

    /// Set the MDX settings override pass.
    pub fn with_mdx_overrides<F>(mut self, f: F) -> Self
    where
        F: Fn(MdxSettings, &Frontmatter) -> MdxSettings + Send + Sync + 'static,
    {
        self.mdx_overrides = Some(Arc::new(f));
        self
    }

    /// Set the Rolldown options override pass.
    pub fn with_bundler_overrides<F>(mut self, f: F) -> Self
    where
        F: Fn(rolldown::BundlerOptions, &Frontmatter) -> rolldown::BundlerOptions
            + Send
            + Sync
            + 'static,
    {
        self.bundler_overrides = Some(Arc::new(f));
        self
    }

    /// All global bindings: the JSX stack plus caller extras.
    pub fn all_bindings(&self) -> Vec<GlobalBinding> {
        let mut bindings = self.jsx.bindings();
        bindings.extend(self.globals.iter().cloned());
        bindings
    }

    /// Fail-fast validation, run before any work starts.
    pub fn validate(&self) -> Result<()> {
        match (&self.output_dir, &self.public_path) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::Config(OUTPUT_PAIR_MESSAGE.to_string()));
            }
            _ => {}
        }

        for (path, contents) in &self.files {
            if path.is_empty() {
                return Err(Error::Config("Virtual file path is empty".to_string()));
            }
            if path.contains('\0') {
                return Err(Error::Config(format!(
                    "Virtual file path contains a null byte: {:?}",
                    path
                )));
            }
            if path.len() > MAX_FILE_PATH_LEN {
                return Err(Error::Config(format!(
                    "Virtual file path too long: {} bytes (max {})",
                    path.len(),
                    MAX_FILE_PATH_LEN
                )));
            }
            if contents.len() > MAX_FILE_SIZE {
                return Err(Error::Config(format!(
                    "Virtual file '{}' too large: {} bytes (max {})",
                    path,
                    contents.len(),
                    MAX_FILE_SIZE
                )));
            }
        }

        for ext in &self.extension_probe_order {
            if !ext.starts_with('.') {
                return Err(Error::Config(format!(
                    "Extension probe entries must start with '.': {:?}",
                    ext
                )));
            }
        }

        Ok(())
    }
}
