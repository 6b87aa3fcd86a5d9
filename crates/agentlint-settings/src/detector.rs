//! Stack auto-detection from project marker files.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

/// Packs implied by the files in `project_dir`, always starting with
/// `universal`.
pub fn detect_stack(project_dir: &Path) -> Vec<String> {
    let mut packs = vec!["universal".to_string()];
    if has_python(project_dir) {
        packs.push("python".to_string());
    }
    if has_react(project_dir) {
        packs.push("react".to_string());
    }
    debug!(project_dir = %project_dir.display(), ?packs, "detected stack");
    packs
}

fn has_python(root: &Path) -> bool {
    root.join("pyproject.toml").exists() || root.join("setup.py").exists()
}

fn has_react(root: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(root.join("package.json")) else {
        return false;
    };
    let Ok(manifest) = serde_json::from_str::<Value>(&content) else {
        debug!("package.json is not valid JSON, skipping react detection");
        return false;
    };
    ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|section| manifest.get(section).and_then(Value::as_object))
        .any(|deps| deps.contains_key("react"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_project_is_universal_only() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect_stack(dir.path()), vec!["universal"]);
    }

    #[test]
    fn python_markers() {
        for marker in ["pyproject.toml", "setup.py"] {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join(marker), "").unwrap();
            assert_eq!(detect_stack(dir.path()), vec!["universal", "python"], "{marker}");
        }
    }

    #[test]
    fn react_from_dev_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "").unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"devDependencies": {"react": "^18.0.0"}}"#,
        )
        .unwrap();
        assert_eq!(detect_stack(dir.path()), vec!["universal", "python", "react"]);
    }

    #[test]
    fn package_json_without_react_or_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"dependencies": {"vue": "3"}}"#).unwrap();
        assert_eq!(detect_stack(dir.path()), vec!["universal"]);

        std::fs::write(dir.path().join("package.json"), "{not json").unwrap();
        assert_eq!(detect_stack(dir.path()), vec!["universal"]);
    }
}
