//! Remove and Regenerate Integration Tests
//!
//! Tests for removing codelabs by directory or source ID, and for the
//! publish policy applied after every mutation.

use std::path::Path;

use codelabs::catalog::{scan_codelabs, ApiDocument, Taxonomy};
use codelabs::cli::{regenerate, remove_codelabs};
use codelabs::config::{EnvOverrides, SiteConfig};
use tempfile::TempDir;

/// A site root with the layout the tool expects
fn make_site(temp: &TempDir) -> SiteConfig {
    let root = temp.path().join("site");
    std::fs::create_dir_all(root.join("tools")).unwrap();
    std::fs::create_dir_all(root.join("src").join("codelabs")).unwrap();
    std::fs::write(root.join("bower.json"), "{}").unwrap();
    std::fs::write(
        root.join("categories-events.json"),
        r##"{"categories": {"intro": {"maincolor": "#111", "secondarycolor": "#222", "lightcolor": "#333"}}}"##,
    )
    .unwrap();

    SiteConfig::load(&root, &EnvOverrides::default()).unwrap()
}

fn write_codelab(content: &Path, dir: &str, source: &str) {
    let path = content.join(dir);
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(
        path.join("codelab.json"),
        format!(
            r#"{{"source": "{source}", "title": "T", "summary": "S", "category": ["intro"],
                "difficulty": 1, "duration": 10, "tags": [], "updated": "2017-01-01",
                "url": "{dir}"}}"#
        ),
    )
    .unwrap();
}

fn read_api(path: &Path) -> ApiDocument {
    ApiDocument::from_json(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_remove_by_directory_and_source_id() {
    let temp = TempDir::new().unwrap();
    let config = make_site(&temp);
    write_codelab(&config.content_dir, "first", "doc-1");
    write_codelab(&config.content_dir, "second", "doc-2");
    write_codelab(&config.content_dir, "third", "doc-3");

    let scan = scan_codelabs(&config.content_dir, &config.scan).await.unwrap();
    let failed = remove_codelabs(
        &config.content_dir,
        &scan.index,
        &["first".to_string(), "doc-2".to_string()],
    )
    .await;

    assert!(failed.is_empty());
    assert!(!config.content_dir.join("first").exists());
    assert!(!config.content_dir.join("second").exists());
    assert!(config.content_dir.join("third").exists());
}

#[tokio::test]
async fn test_remove_reports_unknown_targets() {
    let temp = TempDir::new().unwrap();
    let config = make_site(&temp);
    write_codelab(&config.content_dir, "keep", "doc-keep");

    let scan = scan_codelabs(&config.content_dir, &config.scan).await.unwrap();
    let failed = remove_codelabs(
        &config.content_dir,
        &scan.index,
        &["missing".to_string(), "../site".to_string(), "keep".to_string()],
    )
    .await;

    assert_eq!(failed, vec!["missing", "../site"]);
    assert!(!config.content_dir.join("keep").exists());
    // Path traversal never reaches outside the content directory
    assert!(config.root.exists());
}

#[tokio::test]
async fn test_regenerate_after_removal() {
    let temp = TempDir::new().unwrap();
    let config = make_site(&temp);
    write_codelab(&config.content_dir, "a", "a");
    write_codelab(&config.content_dir, "b", "b");
    let taxonomy = Taxonomy::load(&config.taxonomy_path).await.unwrap();

    regenerate(&config, &taxonomy, false).await.unwrap();
    assert_eq!(read_api(&config.api_path).codelabs.len(), 2);

    let scan = scan_codelabs(&config.content_dir, &config.scan).await.unwrap();
    remove_codelabs(&config.content_dir, &scan.index, &["a".to_string()]).await;
    regenerate(&config, &taxonomy, false).await.unwrap();

    let document = read_api(&config.api_path);
    assert_eq!(document.codelabs.len(), 1);
    assert_eq!(document.codelabs[0].source, "b");
    assert!(document.categories.contains_key("intro"));
}

#[tokio::test]
async fn test_incomplete_scan_blocks_publish() {
    let temp = TempDir::new().unwrap();
    let config = make_site(&temp);
    write_codelab(&config.content_dir, "a", "a");
    let taxonomy = Taxonomy::load(&config.taxonomy_path).await.unwrap();
    regenerate(&config, &taxonomy, false).await.unwrap();

    // A codelab directory without metadata
    write_codelab(&config.content_dir, "b", "b");
    std::fs::create_dir_all(config.content_dir.join("broken")).unwrap();

    let err = regenerate(&config, &taxonomy, false).await.unwrap_err();
    assert!(format!("{:#}", err).contains("broken: metadata unreadable"));

    // The previous document is left untouched
    assert_eq!(read_api(&config.api_path).codelabs.len(), 1);
}

#[tokio::test]
async fn test_allow_partial_publishes_successes() {
    let temp = TempDir::new().unwrap();
    let config = make_site(&temp);
    write_codelab(&config.content_dir, "a", "a");
    write_codelab(&config.content_dir, "b", "b");
    std::fs::create_dir_all(config.content_dir.join("broken")).unwrap();
    let taxonomy = Taxonomy::load(&config.taxonomy_path).await.unwrap();

    let document = regenerate(&config, &taxonomy, true).await.unwrap();

    assert_eq!(document.codelabs.len(), 2);
    assert_eq!(read_api(&config.api_path), document);
}
