//! Scenario tests for complete package builds

#[path = "../helpers.rs"]
mod helpers;

mod build_order;
mod manifest_paths;
