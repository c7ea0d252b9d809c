//! Test: Build Order - dependency order emerges from retry-by-requeue

use crate::helpers::*;
use flatpack::execution::BuildEvent;
use tempfile::TempDir;

/// A unit dequeued before its dependency is deferred to the back of the
/// queue and retried after the dependency builds
#[tokio::test]
async fn test_dependent_secondary_defers_until_primary_built() {
    let dir = TempDir::new().unwrap();
    let mut pkg = test_package(
        dir.path(),
        "@acme/core",
        &[("@acme/testing", &["@acme/core"])],
    );
    tokio::fs::create_dir_all(&pkg.src).await.unwrap();

    let result = run_build(&mut pkg, MockToolChain::new()).await;

    result.result.as_ref().unwrap();
    assert_all_built(&pkg);
    // Primary is first in the queue and has no dependencies, so nothing
    // needed deferring
    assert_build_order(&result, &["@acme/core", "@acme/testing"]);
    assert!(deferred_modules(&result).is_empty());
}

/// With the dependency behind the dependent in the queue, the dependent is
/// requeued and the completion order inverts the seed order
#[tokio::test]
async fn test_requeue_inverts_seed_order() {
    let dir = TempDir::new().unwrap();
    let mut pkg = test_package(
        dir.path(),
        "@acme/core",
        &[("@acme/testing", &["@acme/http"]), ("@acme/http", &[])],
    );
    tokio::fs::create_dir_all(&pkg.src).await.unwrap();

    let result = run_build(&mut pkg, MockToolChain::new()).await;

    result.result.as_ref().unwrap();
    assert_all_built(&pkg);
    assert_build_order(&result, &["@acme/core", "@acme/http", "@acme/testing"]);
    assert_eq!(deferred_modules(&result), vec!["@acme/testing"]);

    // The deferral names the missing dependency
    let missing = result
        .events
        .iter()
        .find_map(|event| match event {
            BuildEvent::EntryPointDeferred { missing, .. } => Some(missing.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(missing, vec!["@acme/http"]);
}

/// A primary that builds after its dependency must not clobber the
/// dependency's already-published output nested under the package root
#[tokio::test]
async fn test_late_primary_keeps_secondary_output() {
    let dir = TempDir::new().unwrap();
    let mut pkg = test_package(dir.path(), "@acme/core", &[("@acme/testing", &[])]);
    pkg.primary.depends_on = vec!["@acme/testing".to_string()];
    tokio::fs::create_dir_all(&pkg.src).await.unwrap();

    let result = run_build(&mut pkg, MockToolChain::new()).await;

    result.result.as_ref().unwrap();
    assert_all_built(&pkg);
    assert_build_order(&result, &["@acme/testing", "@acme/core"]);
    assert!(pkg.dest.join("testing/package.json").exists());
    assert!(pkg.dest.join("package.json").exists());
}

/// A chain of dependencies across several deferral rounds still converges
#[tokio::test]
async fn test_dependency_chain_converges() {
    let dir = TempDir::new().unwrap();
    let mut pkg = test_package(
        dir.path(),
        "@acme/core",
        &[
            ("@acme/a", &["@acme/b"]),
            ("@acme/b", &["@acme/c"]),
            ("@acme/c", &[]),
        ],
    );
    tokio::fs::create_dir_all(&pkg.src).await.unwrap();

    let result = run_build(&mut pkg, MockToolChain::new()).await;

    result.result.as_ref().unwrap();
    assert_all_built(&pkg);
    assert_build_order(
        &result,
        &["@acme/core", "@acme/c", "@acme/b", "@acme/a"],
    );
}
