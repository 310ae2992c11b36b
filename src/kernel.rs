use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ParseError;
use crate::files::{ExcludeNode, FileNode, FilesNode, MatchNode};
use crate::model::{
    AuthorNode, CleanFilesNode, CleanupNode, ConfigurationNode, DatabaseProjectNode,
    DatabaseReferenceNode, PackageReferenceNode, ProcessNode, ProjectNode, ProjectReferenceNode,
    ReferenceNode, ReferencePathNode, SolutionNode,
};
use crate::options::OptionsNode;
use crate::registry::{NodeKind, NodeRegistry};

// ═══════════════════════════════════════════════════════════════════════════════
//  Kernel – document processing and node dispatch
// ═══════════════════════════════════════════════════════════════════════════════

/// The closed result of parsing one declarative element.
///
/// Containers route a parsed child into their owned collections by matching
/// on this type; a child kind a container does not expect is simply ignored
/// there (it was still structurally valid per the registry).
#[derive(Debug)]
pub enum ParsedNode {
    Solution(SolutionNode),
    Project(ProjectNode),
    Configuration(ConfigurationNode),
    Options(OptionsNode),
    Files(FilesNode),
    File(FileNode),
    Match(MatchNode),
    Exclude(ExcludeNode),
    Reference(ReferenceNode),
    ReferencePath(ReferencePathNode),
    ProjectReference(ProjectReferenceNode),
    PackageReference(PackageReferenceNode),
    Author(AuthorNode),
    DatabaseProject(DatabaseProjectNode),
    DatabaseReference(DatabaseReferenceNode),
    Cleanup(CleanupNode),
    CleanFiles(CleanFilesNode),
    Process(ProcessNode),
}

/// The parent context a node parses under.
///
/// This replaces a back-pointer: the partially-built parent is passed down
/// explicitly so a node can consult inherited state (configuration templates,
/// solution options, the owning project's name) while it parses.
#[derive(Clone, Copy)]
pub(crate) enum Scope<'a> {
    Root,
    Solution(&'a SolutionNode),
    Project(&'a ProjectNode),
    Files { project: Option<&'a str> },
    Other,
}

impl<'a> Scope<'a> {
    fn solution(&self) -> Option<&'a SolutionNode> {
        match self {
            Scope::Solution(solution) => Some(solution),
            _ => None,
        }
    }

    fn parent_options(&self) -> Option<&'a crate::options::OptionsNode> {
        match self {
            Scope::Solution(solution) => Some(&solution.options),
            _ => None,
        }
    }

    fn project_name(&self) -> Option<&'a str> {
        match self {
            Scope::Project(project) => Some(project.name.as_str()),
            Scope::Files { project } => *project,
            _ => None,
        }
    }
}

/// An explicit directory stack standing in for the ambient process working
/// directory. Strictly nested: every `push` is paired with a `pop` once the
/// pushing node's subtree has parsed, restoring the directory its siblings
/// resolve against.
#[derive(Debug)]
struct DirStack {
    stack: Vec<PathBuf>,
}

impl DirStack {
    fn new(base: PathBuf) -> Self {
        DirStack { stack: vec![base] }
    }

    fn current(&self) -> &Path {
        match self.stack.last() {
            Some(dir) => dir,
            None => Path::new("."),
        }
    }

    fn push(&mut self, dir: PathBuf) {
        self.stack.push(dir);
    }

    fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }
}

/// Drives the parse of build documents and owns the resulting solutions.
///
/// One kernel processes any number of top-level documents; `Process`
/// directives encountered along the way splice further documents in. The
/// finished object model is read through [`Kernel::solutions`].
#[derive(Debug)]
pub struct Kernel {
    registry: NodeRegistry,
    exclude_folders: HashSet<String>,
    check_os_vars: bool,
    dirs: DirStack,
    pub solutions: Vec<SolutionNode>,
}

impl Kernel {
    /// A kernel resolving paths against the process working directory.
    pub fn new() -> Result<Kernel, ParseError> {
        let base = env::current_dir().map_err(|source| ParseError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Kernel::with_base(base))
    }

    /// A kernel resolving paths against `base`.
    pub fn with_base(base: PathBuf) -> Kernel {
        Kernel {
            registry: NodeRegistry::builtin(),
            exclude_folders: HashSet::new(),
            check_os_vars: false,
            dirs: DirStack::new(base),
            solutions: Vec::new(),
        }
    }

    /// Add a directory name skipped during recursive file matching.
    /// Comparison is case-insensitive.
    pub fn add_exclude_folder(&mut self, name: &str) {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            self.exclude_folders.insert(trimmed.to_lowercase());
        }
    }

    pub(crate) fn exclude_folders(&self) -> &HashSet<String> {
        &self.exclude_folders
    }

    /// Whether `$(VAR)` references interpolate from the OS environment, as
    /// declared by the current document's root `checkOsVars` attribute.
    pub fn check_os_vars(&self) -> bool {
        self.check_os_vars
    }

    pub(crate) fn current_dir(&self) -> &Path {
        self.dirs.current()
    }

    pub(crate) fn push_dir(&mut self, dir: PathBuf) {
        self.dirs.push(dir);
    }

    pub(crate) fn pop_dir(&mut self) {
        self.dirs.pop();
    }

    /// Resolve a declared path to an existing directory, relative to the
    /// ambient directory. Failure is fatal for the declaring node.
    pub(crate) fn resolve_dir(&self, declared: &str) -> Result<PathBuf, ParseError> {
        let joined = if declared.is_empty() {
            self.current_dir().to_path_buf()
        } else {
            self.current_dir().join(declared)
        };
        joined
            .canonicalize()
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| ParseError::UnresolvedPath(declared.to_string()))
    }

    /// Resolve a declared path to an existing file, relative to the ambient
    /// directory.
    pub(crate) fn resolve_file(&self, declared: &str) -> Result<PathBuf, ParseError> {
        if declared.is_empty() {
            return Err(ParseError::UnresolvedPath(declared.to_string()));
        }
        self.current_dir()
            .join(declared)
            .canonicalize()
            .ok()
            .filter(|p| p.is_file())
            .ok_or_else(|| ParseError::UnresolvedPath(declared.to_string()))
    }

    /// Expand `$(VAR)` references from the OS environment when the document
    /// opted in via `checkOsVars`. Unknown variables expand to nothing.
    pub(crate) fn interpolate(&self, raw: &str) -> String {
        if !self.check_os_vars || !raw.contains("$(") {
            return raw.to_string();
        }
        let mut result = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'(') {
                chars.next();
                let var: String = chars.by_ref().take_while(|&ch| ch != ')').collect();
                if let Ok(value) = env::var(&var) {
                    result.push_str(&value);
                }
            } else {
                result.push(c);
            }
        }
        result
    }

    // ─── Document processing ─────────────────────────────────────────────

    /// Process a top-level build document, appending its solutions to
    /// [`Kernel::solutions`].
    pub fn process_file(&mut self, file: &str) -> Result<(), ParseError> {
        let path = self.resolve_file(file)?;
        let solutions = self.splice_document(&path)?;
        self.solutions.extend(solutions);
        Ok(())
    }

    /// Parse the document at `path` with the ambient directory set to the
    /// document's own directory, restoring it afterwards.
    pub(crate) fn splice_document(&mut self, path: &Path) -> Result<Vec<SolutionNode>, ParseError> {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.push_dir(dir);
        let outcome = self.parse_document(path);
        self.pop_dir();
        outcome
    }

    fn parse_document(&mut self, path: &Path) -> Result<Vec<SolutionNode>, ParseError> {
        let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = roxmltree::Document::parse(&text).map_err(|source| ParseError::Xml {
            path: path.to_path_buf(),
            source,
        })?;
        let root = doc.root_element();
        self.check_os_vars = bool_attr(&root, "checkOsVars", false);

        let mut solutions = Vec::new();
        for child in root.children().filter(|n| n.is_element()) {
            match self.parse_node(&child, Scope::Root)? {
                Some(ParsedNode::Solution(solution)) => solutions.push(solution),
                Some(ParsedNode::Process(process)) => {
                    if !process.is_valid {
                        continue;
                    }
                    // A fatal inside the spliced document aborts only that
                    // splice; the rest of this document still parses.
                    match self.splice_document(&process.path) {
                        Ok(mut spliced) => solutions.append(&mut spliced),
                        Err(err) => tracing::error!("{err}"),
                    }
                }
                _ => {}
            }
        }
        Ok(solutions)
    }

    // ─── Node dispatch ───────────────────────────────────────────────────

    /// Parse one element into a typed node.
    ///
    /// The registry resolves the element's tag name; an unknown name is a
    /// logged warning and yields `None`. The resolved node parses with its
    /// parent scope available. A node whose parse raises a warning is logged
    /// and dropped (`None`); a fatal error propagates.
    pub(crate) fn parse_node(
        &mut self,
        node: &roxmltree::Node,
        scope: Scope<'_>,
    ) -> Result<Option<ParsedNode>, ParseError> {
        let name = node.tag_name().name();
        let Some(kind) = self.registry.resolve(name) else {
            tracing::warn!("unknown element: {name}");
            return Ok(None);
        };

        let parsed = match kind {
            NodeKind::Solution => {
                SolutionNode::parse(self, node, scope.solution()).map(ParsedNode::Solution)
            }
            NodeKind::Project => {
                ProjectNode::parse(self, node, scope.solution()).map(ParsedNode::Project)
            }
            NodeKind::Configuration => {
                ConfigurationNode::parse(self, node, scope.parent_options())
                    .map(ParsedNode::Configuration)
            }
            NodeKind::Options => Ok(ParsedNode::Options(OptionsNode::parse(self, node))),
            NodeKind::Files => {
                FilesNode::parse(self, node, scope.project_name()).map(ParsedNode::Files)
            }
            NodeKind::File => FileNode::parse(self, node).map(ParsedNode::File),
            NodeKind::Match => {
                MatchNode::parse(self, node, scope.project_name()).map(ParsedNode::Match)
            }
            NodeKind::Exclude => ExcludeNode::parse(node).map(ParsedNode::Exclude),
            NodeKind::Reference => ReferenceNode::parse(node).map(ParsedNode::Reference),
            NodeKind::ReferencePath => {
                ReferencePathNode::parse(self, node).map(ParsedNode::ReferencePath)
            }
            NodeKind::ProjectReference => {
                ProjectReferenceNode::parse(node).map(ParsedNode::ProjectReference)
            }
            NodeKind::PackageReference => {
                PackageReferenceNode::parse(node).map(ParsedNode::PackageReference)
            }
            NodeKind::Author => AuthorNode::parse(node).map(ParsedNode::Author),
            NodeKind::DatabaseProject => {
                DatabaseProjectNode::parse(self, node).map(ParsedNode::DatabaseProject)
            }
            NodeKind::DatabaseReference => {
                DatabaseReferenceNode::parse(node).map(ParsedNode::DatabaseReference)
            }
            NodeKind::Cleanup => CleanupNode::parse(self, node).map(ParsedNode::Cleanup),
            NodeKind::CleanFiles => CleanFilesNode::parse(node).map(ParsedNode::CleanFiles),
            NodeKind::Process => ProcessNode::parse(self, node).map(ParsedNode::Process),
        };

        match parsed {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) if err.is_warning() => {
                tracing::warn!("{err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  XML attribute helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// The attribute value, or `default` when absent.
pub(crate) fn attr(node: &roxmltree::Node, name: &str, default: &str) -> String {
    node.attribute(name).unwrap_or(default).to_string()
}

/// The attribute value when present.
pub(crate) fn opt_attr(node: &roxmltree::Node, name: &str) -> Option<String> {
    node.attribute(name).map(String::from)
}

/// A boolean attribute; a malformed value is logged and falls back to
/// `default`.
pub(crate) fn bool_attr(node: &roxmltree::Node, name: &str, default: bool) -> bool {
    let Some(raw) = node.attribute(name) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => {
            tracing::warn!("invalid boolean attribute {name}='{raw}'");
            default
        }
    }
}

/// The element's trimmed text content.
pub(crate) fn text_of(node: &roxmltree::Node) -> String {
    node.text().unwrap_or("").trim().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
