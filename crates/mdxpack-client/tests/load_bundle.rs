//! Bundle-then-load round trip against a stub JSX runtime.

use mdxpack::{BundleOptions, EntrySource, bundle};
use mdxpack_client::ComponentLoader;

/// A runtime whose jsx calls flatten children into plain strings, enough to
/// observe what a component renders without a real DOM.
const STUB_RUNTIME: &str = r#"({
    jsx: (type, props) => props && props.children != null ? String(props.children) : "",
    jsxs: (type, props) => props && props.children != null
        ? (Array.isArray(props.children) ? props.children.join("") : String(props.children))
        : "",
    Fragment: "fragment"
})"#;

#[tokio::test]
async fn renders_a_bundled_document() {
    let artifact = bundle(
        BundleOptions::builder()
            .entry(EntrySource::Source("# Round trip works\n".to_string()))
            .build(),
    )
    .await
    .unwrap();

    let mut loader = ComponentLoader::new();
    let runtime = loader.eval(STUB_RUNTIME).unwrap();
    let module = loader
        .load(&artifact.code, vec![("_jsx_runtime".to_string(), runtime)])
        .unwrap();

    let component = loader.default_export(&module).unwrap();
    let props = loader.eval("({})").unwrap();
    let rendered = loader.call(&component, &[props]).unwrap();

    let text = rendered
        .as_string()
        .map(|s| s.to_std_string_escaped())
        .unwrap_or_default();
    assert!(text.contains("Round trip works"), "rendered: {text}");
}

#[tokio::test]
async fn named_exports_survive_the_round_trip() {
    let source = "---\ntitle: Exported\n---\n\nexport const answer = 42\n\n# Hi\n";

    let artifact = bundle(
        BundleOptions::builder()
            .entry(EntrySource::Source(source.to_string()))
            .build(),
    )
    .await
    .unwrap();

    let mut loader = ComponentLoader::new();
    let runtime = loader.eval(STUB_RUNTIME).unwrap();
    let module = loader
        .load(&artifact.code, vec![("_jsx_runtime".to_string(), runtime)])
        .unwrap();

    let answer = loader.export(&module, "answer").unwrap();
    assert_eq!(answer.as_number(), Some(42.0));

    let frontmatter = loader.export(&module, "frontmatter").unwrap();
    assert!(frontmatter.is_object());
}

#[tokio::test]
async fn scope_globals_reach_the_component() {
    let source = "import {pad} from 'padder'\n\n# {pad('hi', 4)}\n";

    let artifact = bundle(
        BundleOptions::builder()
            .entry(EntrySource::Source(source.to_string()))
            .build()
            .with_global("padder", "Padder"),
    )
    .await
    .unwrap();

    let mut loader = ComponentLoader::new();
    let runtime = loader.eval(STUB_RUNTIME).unwrap();
    let padder = loader
        .eval("({pad: (s, n) => String(s).padStart(n, '_')})")
        .unwrap();

    let module = loader
        .load(
            &artifact.code,
            vec![
                ("_jsx_runtime".to_string(), runtime),
                ("Padder".to_string(), padder),
            ],
        )
        .unwrap();

    let component = loader.default_export(&module).unwrap();
    let props = loader.eval("({})").unwrap();
    let rendered = loader.call(&component, &[props]).unwrap();

    let text = rendered
        .as_string()
        .map(|s| s.to_std_string_escaped())
        .unwrap_or_default();
    assert!(text.contains("__hi"), "rendered: {text}");
}
