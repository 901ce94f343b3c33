//! Resolution and loading against the virtual file store.

use anyhow::bail;
use path_clean::PathClean;
use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, Plugin, PluginContext,
};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::store::VirtualFileStore;

/// Serves virtual files to Rolldown.
///
/// Resolution precedence per specifier: the entry token, an exact store
/// match for the importer-joined candidate, an extension probe in the
/// configured order, then the real filesystem (declined so Rolldown
/// resolves natively). A relative specifier that matches nowhere is an
/// error naming the importer; bare specifiers fall through to native
/// resolution.
#[derive(Debug)]
pub struct StorePlugin {
    store: Arc<VirtualFileStore>,
    extensions: Vec<String>,
}

impl StorePlugin {
    pub fn new(store: Arc<VirtualFileStore>, extensions: Vec<String>) -> Self {
        Self { store, extensions }
    }
}

fn claim(id: String) -> HookResolveIdReturn {
    Ok(Some(HookResolveIdOutput {
        id: id.into(),
        external: Some(ResolvedExternal::Bool(false)),
        ..Default::default()
    }))
}

fn exists_on_disk(candidate: &Path, extensions: &[String]) -> bool {
    if candidate.exists() {
        return true;
    }
    let base = candidate.to_string_lossy();
    extensions
        .iter()
        .any(|ext| Path::new(&format!("{base}{ext}")).exists())
}

impl Plugin for StorePlugin {
    fn name(&self) -> Cow<'static, str> {
        "mdxpack-store".into()
    }

    fn register_hook_usage(&self) -> rolldown_plugin::HookUsage {
        use rolldown_plugin::HookUsage;
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let importer = args.importer.map(|s| s.to_string());
        let store = Arc::clone(&self.store);
        let extensions = self.extensions.clone();

        async move {
            if Path::new(&specifier) == store.entry_path() {
                return claim(specifier);
            }

            let importer_dir = importer
                .as_deref()
                .map(Path::new)
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| store.root().to_path_buf());
            let candidate: PathBuf = importer_dir.join(&specifier).clean();

            if store.contains(&candidate) {
                return claim(candidate.to_string_lossy().into_owned());
            }

            if let Some(found) = store.probe(&candidate, &extensions) {
                return claim(found.to_string_lossy().into_owned());
            }

            // A real file wins over an error; Rolldown resolves it natively.
            if exists_on_disk(&candidate, &extensions) {
                return Ok(None);
            }

            if specifier.starts_with("./") || specifier.starts_with("../") {
                let from = match importer.as_deref() {
                    Some(importer) if Path::new(importer) == store.entry_path() => {
                        "the entry MDX file.".to_string()
                    }
                    Some(importer) => {
                        format!("\"{}\"", store.display_relative(Path::new(importer)))
                    }
                    None => "the entry MDX file.".to_string(),
                };
                bail!("Could not resolve \"{specifier}\" in {from}");
            }

            // Bare specifier: node_modules and friends are not ours.
            Ok(None)
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let store = Arc::clone(&self.store);

        async move {
            let path = Path::new(&id);

            if !store.contains(path) {
                return Ok(None);
            }

            // The entry and .mdx imports belong to the MDX plugin.
            if path == store.entry_path() || id.ends_with(".mdx") {
                return Ok(None);
            }

            let Some(source) = store.get(path) else {
                return Ok(None);
            };

            Ok(Some(HookLoadOutput {
                code: source.to_string().into(),
                module_type: Some(infer_module_type(&id)),
                ..Default::default()
            }))
        }
    }
}

/// Infers module type from the file extension. Extensionless virtual files
/// default to JSX, which accepts plain JavaScript too.
fn infer_module_type(id: &str) -> ModuleType {
    match Path::new(id).extension().and_then(|e| e.to_str()) {
        Some("tsx") => ModuleType::Tsx,
        Some("ts") => ModuleType::Ts,
        Some("jsx") => ModuleType::Jsx,
        Some("css") => ModuleType::Css,
        Some("json") => ModuleType::Json,
        Some("js") | Some("mjs") | Some("cjs") => ModuleType::Js,
        Some(_) => ModuleType::Js,
        None => ModuleType::Jsx,
    }
}
