//! End-to-end bundling tests.

use chrono::NaiveDate;
use mdxpack::{
    BundleOptions, EntrySource, Error, MatterValue, bundle, options::OUTPUT_PAIR_MESSAGE,
};
use std::path::PathBuf;

fn from_source(source: &str) -> BundleOptions {
    BundleOptions::builder()
        .entry(EntrySource::Source(source.to_string()))
        .build()
}

#[tokio::test]
async fn bundles_a_plain_document() {
    let artifact = bundle(from_source("# Hello world\n")).await.unwrap();

    assert!(artifact.code.ends_with(";return Component;"));
    assert!(artifact.code.contains("Hello world"));
    assert!(artifact.frontmatter.is_empty());
    assert!(artifact.assets.is_empty());
}

#[tokio::test]
async fn extracts_front_matter() {
    let source = r#"---
title: Example Post
published: 2021-02-13
---

# {frontmatter.title}
"#;

    let artifact = bundle(from_source(source)).await.unwrap();

    assert_eq!(
        artifact.frontmatter.get("title").and_then(MatterValue::as_str),
        Some("Example Post")
    );
    assert_eq!(
        artifact.frontmatter.get("published").and_then(MatterValue::as_date),
        NaiveDate::from_ymd_opt(2021, 2, 13)
    );
    assert_eq!(artifact.matter.raw, "title: Example Post\npublished: 2021-02-13");
    assert!(artifact.matter.content.contains("# {frontmatter.title}"));
}

#[tokio::test]
async fn bundles_virtual_imports() {
    let source = r#"
import Demo from './demo.tsx'
import {info} from './sub/info.js'
import data from './data.json'

# Post

<Demo />

{info} {data.count}
"#;

    let options = from_source(source)
        .with_file(
            "./demo.tsx",
            "export default function Demo() { return <div>neat demo text</div> }",
        )
        .with_file("./sub/info.js", "export const info = 'some js info'")
        .with_file("./data.json", r#"{"count": 3}"#);

    let artifact = bundle(options).await.unwrap();

    assert!(artifact.code.contains("neat demo text"));
    assert!(artifact.code.contains("some js info"));
}

#[tokio::test]
async fn probes_extensions_in_documented_order() {
    let source = "import {marker} from './demo'\n\n# Hi\n\n{marker}\n";

    let options = from_source(source)
        .with_file("./demo.js", "export const marker = 'js marker wins'")
        .with_file("./demo.ts", "export const marker: string = 'ts marker loses'");

    let artifact = bundle(options).await.unwrap();

    assert!(artifact.code.contains("js marker wins"));
    assert!(!artifact.code.contains("ts marker loses"));
}

#[tokio::test]
async fn extensionless_files_default_to_jsx() {
    let source = "import pad from 'left-pad'\n\n# Hi\n\n{pad('a', 3)}\n";

    let options = from_source(source).with_file(
        "left-pad",
        "export default (s, n) => String(s).padStart(n, ' ')",
    );

    assert!(bundle(options).await.is_ok());
}

#[tokio::test]
async fn missing_import_from_entry_names_the_entry() {
    let err = bundle(from_source("import Demo from './demo'\n\n<Demo />\n"))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(
        message.contains(r#"Could not resolve "./demo""#),
        "unexpected message: {message}"
    );
    assert!(
        message.contains("the entry MDX file."),
        "unexpected message: {message}"
    );
}

#[tokio::test]
async fn missing_transitive_import_names_the_importer() {
    let source = "import Demo from './demo.tsx'\n\n<Demo />\n";

    let options = from_source(source).with_file(
        "./demo.tsx",
        "import {gone} from './sub/missing'\nexport default () => <div>{gone}</div>",
    );

    let err = bundle(options).await.unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains(r#"Could not resolve "./sub/missing""#),
        "unexpected message: {message}"
    );
    assert!(
        message.contains(r#""./demo.tsx""#),
        "unexpected message: {message}"
    );
}

#[tokio::test]
async fn duplicate_virtual_files_are_rejected() {
    let options = from_source("# Hi\n")
        .with_file("./demo.js", "export default 1")
        .with_file("demo.js", "export default 2");

    let err = bundle(options).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateFile(_)));
}

#[tokio::test]
async fn inconsistent_output_pair_fails_before_any_work() {
    let mut options = from_source("# Hi\n");
    options.output_dir = Some(PathBuf::from("/tmp/never-used"));

    let err = bundle(options).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Invalid configuration: {OUTPUT_PAIR_MESSAGE}")
    );
}

#[tokio::test]
async fn file_mode_reads_back_and_deletes_the_entry_chunk() {
    let dir = tempfile::tempdir().unwrap();

    let mut options = from_source("# File mode hello\n");
    options.output_dir = Some(dir.path().to_path_buf());
    options.public_path = Some("/assets/bundles".to_string());

    let artifact = bundle(options).await.unwrap();

    assert!(artifact.code.contains("File mode hello"));
    assert!(artifact.code.ends_with(";return Component;"));

    // The entry chunk must not remain on disk.
    let leftover_js: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("js"))
        .collect();
    assert!(leftover_js.is_empty(), "entry chunk left behind: {leftover_js:?}");
}

#[tokio::test]
async fn identical_inputs_produce_identical_output() {
    let source = "---\ntitle: t\n---\n\nimport {x} from './x.js'\n\n# Hi {x}\n";
    let make = || from_source(source).with_file("./x.js", "export const x = 1");

    let a = bundle(make()).await.unwrap();
    let b = bundle(make()).await.unwrap();
    assert_eq!(a.code, b.code);
}

#[tokio::test]
async fn mdx_overrides_see_the_front_matter() {
    let source = "---\ntitle: seen\n---\n\n# Hi\n";

    let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
    let captured = std::sync::Arc::clone(&seen);

    let options = from_source(source).with_mdx_overrides(move |settings, frontmatter| {
        let title = frontmatter
            .get("title")
            .and_then(MatterValue::as_str)
            .map(str::to_string);
        *captured.lock().unwrap() = title;
        settings
    });

    bundle(options).await.unwrap();
    assert_eq!(seen.lock().unwrap().as_deref(), Some("seen"));
}

#[tokio::test]
async fn minify_is_on_by_default() {
    let source = "# Hello minify\n";

    let minified = bundle(from_source(source)).await.unwrap();

    let mut options = from_source(source);
    options.minify = false;
    let plain = bundle(options).await.unwrap();

    assert!(minified.code.len() < plain.code.len());
}

#[tokio::test]
async fn document_entry_resolves_imports_next_to_its_path() {
    let source = "import {x} from './sibling.js'\n\n# Hi {x}\n";

    let options = BundleOptions::builder()
        .entry(EntrySource::Document {
            path: PathBuf::from("posts/entry.mdx"),
            text: source.to_string(),
        })
        .build()
        .with_file("./posts/sibling.js", "export const x = 'sibling value'");

    let artifact = bundle(options).await.unwrap();
    assert!(artifact.code.contains("sibling value"));
}

#[tokio::test]
async fn file_entry_resolves_relative_to_its_directory() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("post.mdx");
    std::fs::write(&entry, "import {x} from './x.js'\n\n# Hi {x}\n").unwrap();
    std::fs::write(dir.path().join("x.js"), "export const x = 'disk value'").unwrap();

    let options = BundleOptions::builder()
        .entry(EntrySource::File(entry))
        .build();

    let artifact = bundle(options).await.unwrap();
    assert!(artifact.code.contains("disk value"));
}
