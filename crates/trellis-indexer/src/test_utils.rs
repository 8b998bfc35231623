//! Test fixtures for workspace scans

use std::fs;
use tempfile::TempDir;

/// Create a temporary workspace with the given `(relative path, content)` files.
/// A path ending in `/` creates an empty directory.
pub fn create_workspace(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        if path.ends_with('/') {
            fs::create_dir_all(&full_path).unwrap();
            continue;
        }

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

/// A small web app: entry point, a component, and an installed dependency.
pub fn create_web_app() -> TempDir {
    create_workspace(&[
        ("src/index.ts", "import { Button } from './components/Button';\n"),
        ("src/components/Button.tsx", "export const Button = () => null;\n"),
        ("node_modules/pkg/index.js", "module.exports = {};\n"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_workspace() {
        let temp_dir = create_workspace(&[("a/b.txt", "x"), ("empty/", "")]);
        assert!(temp_dir.path().join("a/b.txt").is_file());
        assert!(temp_dir.path().join("empty").is_dir());
    }
}
