//! MDX compilation plugin.
//!
//! Claims `.mdx` ids and the entry token, splits front matter, compiles the
//! body with the `mdxjs` compiler, and splices the front matter record back
//! in as an `export const frontmatter` binding.

use anyhow::{Context, anyhow};
use path_clean::PathClean;
use rolldown_common::ModuleType;
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, Plugin, PluginContext,
};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::frontmatter::{self, MatterOptions};
use crate::options::{MdxOverrideFn, MdxSettings};
use crate::store::VirtualFileStore;

pub struct MdxPlugin {
    store: Arc<VirtualFileStore>,
    settings: MdxSettings,
    overrides: Option<Arc<MdxOverrideFn>>,
    matter_options: MatterOptions,
}

impl MdxPlugin {
    pub fn new(
        store: Arc<VirtualFileStore>,
        settings: MdxSettings,
        overrides: Option<Arc<MdxOverrideFn>>,
        matter_options: MatterOptions,
    ) -> Self {
        Self {
            store,
            settings,
            overrides,
            matter_options,
        }
    }

    fn is_mdx_id(&self, id: &str) -> bool {
        id.ends_with(".mdx") || Path::new(id) == self.store.entry_path()
    }
}

impl fmt::Debug for MdxPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MdxPlugin")
            .field("settings", &self.settings)
            .field("matter_options", &self.matter_options)
            .finish_non_exhaustive()
    }
}

impl Plugin for MdxPlugin {
    fn name(&self) -> Cow<'static, str> {
        "mdxpack-mdx".into()
    }

    fn register_hook_usage(&self) -> rolldown_plugin::HookUsage {
        use rolldown_plugin::HookUsage;
        HookUsage::ResolveId | HookUsage::Load
    }

    /// Claims `.mdx` ids with stable absolute paths so Rolldown never
    /// rewrites them relative to a virtual importer.
    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let importer = args.importer.map(|s| s.to_string());
        let store = Arc::clone(&self.store);

        async move {
            if !specifier.ends_with(".mdx") {
                return Ok(None);
            }

            let path = Path::new(&specifier);
            if path.is_absolute() {
                return Ok(Some(HookResolveIdOutput {
                    id: specifier.into(),
                    ..Default::default()
                }));
            }

            if let Some(importer) = importer.as_deref() {
                if specifier.starts_with("./") || specifier.starts_with("../") {
                    if let Some(dir) = Path::new(importer).parent() {
                        let resolved: PathBuf = dir.join(&specifier).clean();
                        if store.contains(&resolved) || resolved.exists() {
                            return Ok(Some(HookResolveIdOutput {
                                id: resolved.to_string_lossy().into_owned().into(),
                                ..Default::default()
                            }));
                        }
                    }
                }
            }

            Ok(None)
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let claimed = self.is_mdx_id(&id);
        let store = Arc::clone(&self.store);
        let settings = self.settings.clone();
        let overrides = self.overrides.clone();
        let matter_options = self.matter_options.clone();

        async move {
            if !claimed {
                return Ok(None);
            }

            let source = match store.get(Path::new(&id)) {
                Some(text) => text.to_string(),
                None => tokio::fs::read_to_string(&id)
                    .await
                    .with_context(|| format!("Failed to read MDX file: {id}"))?,
            };

            let matter = frontmatter::split(&source, &matter_options)?;

            let settings = match &overrides {
                Some(apply) => apply(settings, &matter.data),
                None => settings,
            };

            let compiler_options = settings.to_compiler_options(&id);
            let code = mdxjs::compile(&matter.content, &compiler_options)
                .map_err(|message| anyhow!("Failed to compile MDX file {id}: {message}"))?;

            let code = format!(
                "{code}\nexport const frontmatter = {};\n",
                matter.data.to_js_literal()
            );

            tracing::debug!(path = %id, code_len = code.len(), "MDX compiled");

            Ok(Some(HookLoadOutput {
                code: code.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}
