//! Core data structures for the workspace file tree

use std::cmp::Ordering;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Stable identifier for a scanned entry, derived from its workspace-relative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TreeNodeId(pub u64);

impl TreeNodeId {
    pub fn new(relative_path: &str, kind: EntryKind) -> Self {
        let mut hasher = DefaultHasher::new();
        relative_path.hash(&mut hasher);
        kind.hash(&mut hasher);
        TreeNodeId(hasher.finish())
    }
}

/// Whether a scanned entry is a directory or a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

/// Semantic role assigned to an entry by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticType {
    // ── Source roles ────────────────────────────────────────
    Component,
    Page,
    Hook,
    Service,
    Util,
    Style,
    Test,
    Route,
    Middleware,
    Model,
    Controller,

    // ── Project files ───────────────────────────────────────
    Doc,
    Config,
    Entry,
    Docker,

    // ── Service roles ───────────────────────────────────────
    Backend,
    Frontend,
    Worker,
    DiscordBot,
    Mobile,

    // ── Fallback ────────────────────────────────────────────
    Folder,
    File,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Component => "component",
            SemanticType::Page => "page",
            SemanticType::Hook => "hook",
            SemanticType::Service => "service",
            SemanticType::Util => "util",
            SemanticType::Style => "style",
            SemanticType::Test => "test",
            SemanticType::Route => "route",
            SemanticType::Middleware => "middleware",
            SemanticType::Model => "model",
            SemanticType::Controller => "controller",
            SemanticType::Doc => "doc",
            SemanticType::Config => "config",
            SemanticType::Entry => "entry",
            SemanticType::Docker => "docker",
            SemanticType::Backend => "backend",
            SemanticType::Frontend => "frontend",
            SemanticType::Worker => "worker",
            SemanticType::DiscordBot => "discord-bot",
            SemanticType::Mobile => "mobile",
            SemanticType::Folder => "folder",
            SemanticType::File => "file",
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language tag attached to scanned files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Java,
    C,
    Cpp,
    Css,
    Html,
    Shell,
    Yaml,
    Toml,
    Json,
    Sql,
    Dockerfile,
    Markdown,
    Protobuf,
    GraphQL,
    Text,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("rs") => Language::Rust,
            Some("ts") | Some("tsx") | Some("mts") | Some("cts") => Language::TypeScript,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("py") | Some("pyi") => Language::Python,
            Some("go") => Language::Go,
            Some("java") => Language::Java,
            Some("c") | Some("h") => Language::C,
            Some("cpp") | Some("cc") | Some("cxx") | Some("hpp") | Some("hh") => Language::Cpp,
            Some("css") | Some("scss") | Some("sass") | Some("less") => Language::Css,
            Some("html") | Some("htm") => Language::Html,
            Some("sh") | Some("bash") | Some("zsh") => Language::Shell,
            Some("yml") | Some("yaml") => Language::Yaml,
            Some("toml") => Language::Toml,
            Some("json") | Some("jsonc") => Language::Json,
            Some("sql") => Language::Sql,
            Some("md") | Some("mdx") => Language::Markdown,
            Some("proto") => Language::Protobuf,
            Some("graphql") | Some("gql") => Language::GraphQL,
            _ => {
                if path.file_name().is_some_and(|n| {
                    let s = n.to_string_lossy();
                    s == "Dockerfile" || s.starts_with("Dockerfile.")
                }) {
                    Language::Dockerfile
                } else {
                    Language::Text
                }
            }
        }
    }
}

/// One entry of a scanned workspace. Folders own their children; files carry
/// a language tag and byte size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileTreeNode {
    pub id: TreeNodeId,
    pub name: String,
    /// Absolute path on disk at scan time.
    pub path: PathBuf,
    /// `/`-separated path relative to the workspace root; empty for the root.
    pub relative_path: String,
    pub kind: EntryKind,
    /// Folder named like a deployable service (`backend`, `discord-bot`, ...).
    #[serde(default, skip_serializing_if = "is_false")]
    pub service: bool,
    pub node_type: SemanticType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileTreeNode>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl FileTreeNode {
    pub fn folder(name: String, path: PathBuf, relative_path: String, node_type: SemanticType) -> Self {
        FileTreeNode {
            id: TreeNodeId::new(&relative_path, EntryKind::Folder),
            name,
            path,
            relative_path,
            kind: EntryKind::Folder,
            service: false,
            node_type,
            language: None,
            size: None,
            children: Vec::new(),
        }
    }

    pub fn file(
        name: String,
        path: PathBuf,
        relative_path: String,
        node_type: SemanticType,
        size: u64,
    ) -> Self {
        let language = Language::from_path(&path);
        FileTreeNode {
            id: TreeNodeId::new(&relative_path, EntryKind::File),
            name,
            path,
            relative_path,
            kind: EntryKind::File,
            service: false,
            node_type,
            language: Some(language),
            size: Some(size),
            children: Vec::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Find a descendant (or self) by workspace-relative path.
    pub fn find(&self, relative_path: &str) -> Option<&FileTreeNode> {
        self.iter().find(|n| n.relative_path == relative_path)
    }

    /// Number of files in this subtree.
    pub fn file_count(&self) -> usize {
        self.iter().filter(|n| n.is_file()).count()
    }

    /// Sort children folders-first, then by name.
    pub fn sort_children(&mut self) {
        self.children.sort_by(sibling_order);
    }
}

/// Sibling ordering: folders (service folders included) before files, then
/// lexicographic by name.
pub fn sibling_order(a: &FileTreeNode, b: &FileTreeNode) -> Ordering {
    let rank = |n: &FileTreeNode| match n.kind {
        EntryKind::Folder => 0u8,
        EntryKind::File => 1u8,
    };
    rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
}

/// Iterator returned by [`FileTreeNode::iter`].
pub struct PreOrder<'a> {
    stack: Vec<&'a FileTreeNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a FileTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}
