//! Bundler invocation.
//!
//! Assembles the Rolldown options and plugins for one bundle, runs the
//! build, and wraps the entry chunk into the artifact shape.

use path_clean::PathClean;
use rolldown::{
    BundlerBuilder, BundlerOptions, GlobalsOutputOption, InputItem, IsExternal, OutputFormat,
    Platform, RawMinifyOptions, ResolveOptions,
};
use rolldown_plugin::__inner::SharedPluginable;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::artifact::{self, BundleArtifact};
use crate::diagnostics;
use crate::frontmatter;
use crate::options::{BundleOptions, EntrySource};
use crate::plugins::{MdxPlugin, StorePlugin};
use crate::store::{self, VirtualFileStore};
use crate::{Error, GLOBAL_NAME, Result};

/// Bundle one MDX document and everything it imports into a single
/// executable JavaScript string.
///
/// The entry and the caller's in-memory files are served from a virtual
/// file store; anything else resolves natively (real files, node_modules).
/// The JSX stack and any configured globals stay external and are expected
/// as scope bindings at load time.
pub async fn bundle(options: BundleOptions) -> Result<BundleArtifact> {
    options.validate()?;

    let BundleOptions {
        entry,
        files,
        cwd,
        jsx,
        globals,
        extension_probe_order,
        minify,
        environment_mode,
        output_dir,
        public_path,
        matter: matter_options,
        mdx_overrides,
        bundler_overrides,
    } = options;

    let (root, entry_path, entry_text) = resolve_entry(entry, cwd).await?;

    let matter = frontmatter::split(&entry_text, &matter_options)?;

    let mut store = VirtualFileStore::new(root.clone());
    for (path, contents) in files {
        store.insert(&path, contents)?;
    }
    store.set_entry(entry_path.clone(), entry_text)?;
    let entry_path = store.entry_path().to_path_buf();

    tracing::debug!(
        entry = %entry_path.display(),
        files = store.len(),
        "virtual file store ready"
    );

    let store = Arc::new(store);

    let settings = crate::options::MdxSettings::builder()
        .jsx_import_source(jsx.jsx_library.clone())
        .build();

    let plugins: Vec<SharedPluginable> = vec![
        Arc::new(StorePlugin::new(
            Arc::clone(&store),
            extension_probe_order.clone(),
        )),
        Arc::new(MdxPlugin::new(
            Arc::clone(&store),
            settings,
            mdx_overrides,
            matter_options.clone(),
        )),
    ];

    let mut bindings = jsx.bindings();
    bindings.extend(globals);
    let external: Vec<String> = bindings.iter().map(|b| b.specifier.clone()).collect();
    let globals_map: FxHashMap<String, String> = bindings
        .into_iter()
        .map(|b| (b.specifier, b.var_name))
        .collect();

    let define_entries = vec![(
        "process.env.NODE_ENV".to_string(),
        serde_json::Value::String(environment_mode).to_string(),
    )];

    let mut bundler_options = BundlerOptions {
        input: Some(vec![InputItem {
            name: None,
            import: entry_path.to_string_lossy().into_owned(),
        }]),
        cwd: Some(root.clone()),
        format: Some(OutputFormat::Iife),
        name: Some(GLOBAL_NAME.to_string()),
        platform: Some(Platform::Browser),
        external: Some(IsExternal::from(external)),
        globals: Some(GlobalsOutputOption::from(globals_map)),
        minify: if minify {
            Some(RawMinifyOptions::from(true))
        } else {
            None
        },
        define: Some(define_entries.into_iter().collect()),
        resolve: Some(configure_resolution(&root, &extension_probe_order)),
        ..Default::default()
    };

    let file_mode = output_dir.zip(public_path);
    if let Some((dir, _)) = &file_mode {
        bundler_options.dir = Some(dir.to_string_lossy().into_owned());
    }

    if let Some(apply) = &bundler_overrides {
        bundler_options = apply(bundler_options, &matter.data);
    }

    let mut bundler = BundlerBuilder::default()
        .with_options(bundler_options)
        .with_plugins(plugins)
        .build()
        .map_err(|e| Error::from_bundler(&e))?;

    let output = if file_mode.is_some() {
        bundler.write().await
    } else {
        bundler.generate().await
    }
    .map_err(|e| Error::from_bundler(&e))?;

    let diagnostics = diagnostics::extract_warnings(&output.warnings);

    let entry_chunk = find_entry_chunk(&output.assets).ok_or_else(|| {
        Error::Bundler(vec![diagnostics::BundleDiagnostic {
            severity: diagnostics::DiagnosticSeverity::Error,
            message: "No JavaScript chunk found in bundle output".to_string(),
            file: None,
            line: None,
            column: None,
        }])
    })?;

    let (code, assets) = match &file_mode {
        Some((dir, prefix)) => {
            let code = read_back_and_delete(dir, entry_chunk.filename.as_str()).await?;
            let assets = collect_assets(&output.assets, entry_chunk, Some(prefix.as_str()));
            (code, assets)
        }
        None => {
            let assets = collect_assets(&output.assets, entry_chunk, None);
            (entry_chunk.code.clone(), assets)
        }
    };

    tracing::debug!(code_len = code.len(), assets = assets.len(), "bundle complete");

    Ok(BundleArtifact {
        code: artifact::wrap(code),
        frontmatter: matter.data.clone(),
        matter,
        diagnostics,
        assets,
    })
}

/// Resolve the entry source into a working directory, an absolute entry
/// path, and the entry text.
async fn resolve_entry(
    entry: EntrySource,
    cwd: Option<PathBuf>,
) -> Result<(PathBuf, PathBuf, String)> {
    match entry {
        EntrySource::Source(text) => {
            let root = resolve_root(cwd)?;
            let entry_path = store::entry_token(&root);
            Ok((root, entry_path, text))
        }
        EntrySource::File(path) => {
            let path = if path.is_absolute() {
                path.clean()
            } else {
                std::env::current_dir()?.join(path).clean()
            };
            let text = tokio::fs::read_to_string(&path).await?;
            let root = match cwd {
                Some(dir) => dir,
                None => path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("/")),
            };
            Ok((root, path, text))
        }
        EntrySource::Document { path, text } => {
            let root = resolve_root(cwd)?;
            let entry_path = if path.is_absolute() {
                path.clean()
            } else {
                root.join(path).clean()
            };
            Ok((root, entry_path, text))
        }
    }
}

fn resolve_root(cwd: Option<PathBuf>) -> Result<PathBuf> {
    match cwd {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?.join(store::FAKE_DIR)),
    }
}

/// Native resolution stays restricted to the documented extension set, and
/// walks node_modules up from the working directory.
fn configure_resolution(root: &Path, extensions: &[String]) -> ResolveOptions {
    let mut modules = Vec::new();
    let mut current = root;
    loop {
        modules.push(current.join("node_modules").to_string_lossy().into_owned());
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    modules.push("node_modules".to_string());

    ResolveOptions {
        extensions: Some(extensions.to_vec()),
        modules: Some(modules),
        symlinks: Some(true),
        ..Default::default()
    }
}

fn find_entry_chunk(assets: &[rolldown_common::Output]) -> Option<&rolldown_common::OutputChunk> {
    let mut first = None;
    for asset in assets {
        if let rolldown_common::Output::Chunk(chunk) = asset {
            if chunk.is_entry {
                return Some(chunk.as_ref());
            }
            if first.is_none() {
                first = Some(chunk.as_ref());
            }
        }
    }
    first
}

fn collect_assets(
    assets: &[rolldown_common::Output],
    entry_chunk: &rolldown_common::OutputChunk,
    prefix: Option<&str>,
) -> Vec<String> {
    assets
        .iter()
        .filter_map(|asset| {
            let filename = match asset {
                rolldown_common::Output::Chunk(chunk) => {
                    if chunk.filename == entry_chunk.filename {
                        return None;
                    }
                    chunk.filename.to_string()
                }
                rolldown_common::Output::Asset(asset) => asset.filename.to_string(),
            };
            Some(match prefix {
                Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), filename),
                None => filename,
            })
        })
        .collect()
}

/// File mode: the entry chunk is read back from disk and removed, leaving
/// only the non-entry assets behind.
async fn read_back_and_delete(dir: &Path, filename: &str) -> Result<String> {
    let path = dir.join(filename);
    let read = tokio::fs::read_to_string(&path).await;
    let removed = tokio::fs::remove_file(&path).await;
    let code = read?;
    removed?;
    Ok(code)
}
