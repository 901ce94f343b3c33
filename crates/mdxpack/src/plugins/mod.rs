//! Rolldown plugins serving the virtual file store.
//!
//! Two plugins run in a fixed order: the store plugin resolves and loads
//! non-MDX virtual files, and the MDX plugin compiles `.mdx` sources. The
//! store plugin declines `.mdx` loads so the responsibilities stay
//! disjoint.

mod mdx_plugin;
mod store_plugin;

pub use mdx_plugin::MdxPlugin;
pub use store_plugin::StorePlugin;
