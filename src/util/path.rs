//! Path normalization for manifest fields

use std::path::{Component, Path};

/// Compute `target` relative to `base` as a forward-slash path
///
/// Both paths must be absolute or share the same anchor. Walks out of the
/// non-shared part of `base` with `..` components.
pub fn relative_unix(base: &Path, target: &Path) -> String {
    let base_components: Vec<Component> = base.components().collect();
    let target_components: Vec<Component> = target.components().collect();

    let common = base_components
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base_components.len() {
        parts.push("..".to_string());
    }
    for component in &target_components[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
