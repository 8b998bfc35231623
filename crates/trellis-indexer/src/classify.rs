//! Heuristic semantic classification of workspace entries
//!
//! Files are classified by the strongest signal available, in order:
//! explicit file name, then the nearest role-named parent directory, then
//! extension. The first signal that matches wins.

use std::sync::LazyLock;

use regex::Regex;
use trellis_core::SemanticType;

/// Folder names that mark a deployable service root.
const SERVICE_FOLDER_NAMES: &[&str] = &["backend", "frontend", "api", "worker", "bot", "mobile"];

/// Manifests, lockfiles and tool configs recognised by exact (lowercase) name.
const CONFIG_FILE_NAMES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "tsconfig.json",
    "jsconfig.json",
    "cargo.toml",
    "cargo.lock",
    "pyproject.toml",
    "requirements.txt",
    "pipfile",
    "setup.cfg",
    "go.mod",
    "go.sum",
    "gemfile",
    "composer.json",
    "makefile",
];

const ENTRY_STEMS: &[&str] = &["index", "main", "app"];

const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "py", "rs", "go"];

const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less"];

static TOOL_CONFIG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\w.-]+\.config\.(js|ts|mjs|cjs)$").expect("valid regex")
});

static TEST_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\.(test|spec)\.[a-z0-9]+$)|(_test\.[a-z0-9]+$)|(^test_.+\.py$)")
        .expect("valid regex")
});

/// Classify a directory by its name alone.
pub fn classify_folder(name: &str) -> SemanticType {
    match name.to_ascii_lowercase().as_str() {
        "components" => SemanticType::Component,
        "pages" => SemanticType::Page,
        "hooks" => SemanticType::Hook,
        "services" => SemanticType::Service,
        "utils" | "helpers" => SemanticType::Util,
        "styles" => SemanticType::Style,
        "tests" | "__tests__" | "test" => SemanticType::Test,
        "routes" => SemanticType::Route,
        "middleware" => SemanticType::Middleware,
        "models" => SemanticType::Model,
        "controllers" => SemanticType::Controller,
        "docs" => SemanticType::Doc,
        "config" => SemanticType::Config,
        "backend" | "server" | "api" => SemanticType::Backend,
        "frontend" | "client" | "web" => SemanticType::Frontend,
        "worker" | "workers" => SemanticType::Worker,
        "bot" | "discord-bot" => SemanticType::DiscordBot,
        "mobile" => SemanticType::Mobile,
        _ => SemanticType::Folder,
    }
}

/// Whether a directory is named like a service root: any hyphenated name, or
/// one of the well-known role names.
pub fn is_service_folder(name: &str) -> bool {
    name.contains('-') || SERVICE_FOLDER_NAMES.contains(&name.to_ascii_lowercase().as_str())
}

/// Classify a file from its name and the workspace-relative path of the
/// directory containing it (`""` for the workspace root).
pub fn classify_file(name: &str, parent_relative_path: &str) -> SemanticType {
    by_name(name)
        .or_else(|| by_parent_path(parent_relative_path))
        .or_else(|| by_extension(name))
        .unwrap_or(SemanticType::File)
}

fn by_name(name: &str) -> Option<SemanticType> {
    let lower = name.to_ascii_lowercase();

    if name.starts_with('.')
        || CONFIG_FILE_NAMES.contains(&lower.as_str())
        || TOOL_CONFIG.is_match(name)
    {
        return Some(SemanticType::Config);
    }

    let (stem, ext) = lower.rsplit_once('.')?;
    if ENTRY_STEMS.contains(&stem) && SOURCE_EXTENSIONS.contains(&ext) {
        return Some(SemanticType::Entry);
    }
    None
}

fn by_parent_path(parent_relative_path: &str) -> Option<SemanticType> {
    parent_relative_path
        .rsplit('/')
        .find_map(|segment| match segment.to_ascii_lowercase().as_str() {
            "components" => Some(SemanticType::Component),
            "pages" => Some(SemanticType::Page),
            "hooks" => Some(SemanticType::Hook),
            "services" => Some(SemanticType::Service),
            "utils" => Some(SemanticType::Util),
            "styles" => Some(SemanticType::Style),
            "tests" | "__tests__" => Some(SemanticType::Test),
            "routes" => Some(SemanticType::Route),
            "middleware" => Some(SemanticType::Middleware),
            "models" => Some(SemanticType::Model),
            "controllers" => Some(SemanticType::Controller),
            "docs" => Some(SemanticType::Doc),
            _ => None,
        })
}

fn by_extension(name: &str) -> Option<SemanticType> {
    let lower = name.to_ascii_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext);

    if ext.is_some_and(|e| STYLE_EXTENSIONS.contains(&e)) {
        return Some(SemanticType::Style);
    }
    if TEST_FILE.is_match(name) {
        return Some(SemanticType::Test);
    }
    if matches!(ext, Some("md") | Some("mdx")) {
        return Some(SemanticType::Doc);
    }
    if lower == "dockerfile"
        || lower.starts_with("dockerfile.")
        || ext == Some("dockerfile")
        || lower == "docker-compose.yml"
        || lower == "docker-compose.yaml"
    {
        return Some(SemanticType::Docker);
    }
    None
}
