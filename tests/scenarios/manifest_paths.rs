//! Test: Manifest Paths - each unit's manifest is relative to its own
//! destination

use crate::helpers::*;
use serde_json::Value;
use tempfile::TempDir;

async fn read_manifest(path: &std::path::Path) -> Value {
    let contents = tokio::fs::read_to_string(path).await.unwrap();
    serde_json::from_str(&contents).unwrap()
}

/// The primary's manifest points at artifacts inside the package output root
#[tokio::test]
async fn test_primary_manifest_fields() {
    let dir = TempDir::new().unwrap();
    let mut pkg = test_package(dir.path(), "@acme/core", &[]);
    tokio::fs::create_dir_all(&pkg.src).await.unwrap();

    run_build(&mut pkg, MockToolChain::new())
        .await
        .result
        .unwrap();

    let manifest = read_manifest(&pkg.dest.join("package.json")).await;
    assert_eq!(manifest["name"], "@acme/core");
    assert_eq!(manifest["main"], "bundles/acme-core.umd.js");
    assert_eq!(manifest["module"], "esm5/acme-core.js");
    assert_eq!(manifest["es2015"], "esm2015/acme-core.js");
    assert_eq!(manifest["typings"], "acme-core.d.ts");
    assert_eq!(manifest["metadata"], "acme-core.metadata.json");
}

/// A secondary's manifest is relative to the secondary's own destination
/// directory, never the primary's
#[tokio::test]
async fn test_secondary_manifest_is_unit_relative() {
    let dir = TempDir::new().unwrap();
    let mut pkg = test_package(dir.path(), "@acme/core", &[("@acme/http", &[])]);
    tokio::fs::create_dir_all(&pkg.src).await.unwrap();

    run_build(&mut pkg, MockToolChain::new())
        .await
        .result
        .unwrap();

    let manifest = read_manifest(&pkg.dest.join("http/package.json")).await;
    assert_eq!(manifest["name"], "@acme/http");
    assert_eq!(manifest["main"], "bundles/acme-http.umd.js");
    assert_eq!(manifest["module"], "esm5/acme-http.js");
    assert_eq!(manifest["es2015"], "esm2015/acme-http.js");
    assert_eq!(manifest["typings"], "acme-http.d.ts");
    assert_eq!(manifest["metadata"], "acme-http.metadata.json");
}
