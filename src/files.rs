use indexmap::IndexMap;
use regex::Regex;

use crate::error::ParseError;
use crate::kernel::{Kernel, Scope, attr, bool_attr, text_of};
use crate::matcher::{MatchPattern, scan_files};

// ═══════════════════════════════════════════════════════════════════════════════
//  File sets – explicit entries, pattern matches, and per-file metadata
// ═══════════════════════════════════════════════════════════════════════════════

/// What an emitter should do with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildAction {
    None,
    Compile,
    Content,
    EmbeddedResource,
    ApplicationDefinition,
    Page,
    Copy,
}

impl BuildAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "None" => Some(BuildAction::None),
            "Compile" => Some(BuildAction::Compile),
            "Content" => Some(BuildAction::Content),
            "EmbeddedResource" => Some(BuildAction::EmbeddedResource),
            "ApplicationDefinition" => Some(BuildAction::ApplicationDefinition),
            "Page" => Some(BuildAction::Page),
            "Copy" => Some(BuildAction::Copy),
            _ => None,
        }
    }
}

/// IDE-facing classification of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubType {
    Code,
    Component,
    Designer,
    Form,
    Settings,
    UserControl,
    CodeBehind,
}

impl SubType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Code" => Some(SubType::Code),
            "Component" => Some(SubType::Component),
            "Designer" => Some(SubType::Designer),
            "Form" => Some(SubType::Form),
            "Settings" => Some(SubType::Settings),
            "UserControl" => Some(SubType::UserControl),
            "CodeBehind" => Some(SubType::CodeBehind),
            _ => None,
        }
    }
}

/// Copy-to-output-directory policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyToOutput {
    #[default]
    Never,
    Always,
    PreserveNewest,
}

impl CopyToOutput {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Never" => Some(CopyToOutput::Never),
            "Always" => Some(CopyToOutput::Always),
            "PreserveNewest" => Some(CopyToOutput::PreserveNewest),
            _ => None,
        }
    }
}

// File extensions served as web content rather than compiled.
const WEB_TYPES: [&str; 5] = ["aspx", "ascx", "master", "ashx", "asmx"];

fn default_build_action(path: &str) -> BuildAction {
    let extension = extension_of(path);
    if WEB_TYPES.contains(&extension.as_str()) {
        BuildAction::Content
    } else {
        BuildAction::Compile
    }
}

fn default_sub_type(path: &str) -> SubType {
    let lower = path.to_lowercase();
    if extension_of(path) == "resx" {
        return SubType::Designer;
    }
    if lower.ends_with(".settings") {
        return SubType::Settings;
    }
    if WEB_TYPES.iter().any(|t| lower.ends_with(t)) {
        return SubType::CodeBehind;
    }
    SubType::Code
}

fn extension_of(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

// ─── FileNode ────────────────────────────────────────────────────────────────

/// A single explicitly-declared file (`<File>`). The element text is the path,
/// relative to the declaring project or solution.
#[derive(Debug, Clone, Default)]
pub struct FileNode {
    pub path: String,
    resource_name: String,
    build_action: Option<BuildAction>,
    sub_type: Option<SubType>,
    copy_to_output: CopyToOutput,
    is_link: bool,
    link_path: String,
    preserve_path: bool,
    valid: bool,
}

impl FileNode {
    pub fn parse(kernel: &Kernel, node: &roxmltree::Node) -> Result<FileNode, ParseError> {
        let mut file = FileNode::default();
        file.build_action = parse_enum_attr(node, "buildAction", BuildAction::parse);
        file.sub_type = parse_enum_attr(node, "subType", SubType::parse);
        file.resource_name = attr(node, "resourceName", "");
        file.is_link = bool_attr(node, "link", false);
        if file.is_link {
            file.link_path = attr(node, "linkPath", "");
        }
        file.copy_to_output =
            parse_enum_attr(node, "copyToOutput", CopyToOutput::parse).unwrap_or_default();
        file.preserve_path = bool_attr(node, "preservePath", false);

        file.path = kernel.interpolate(&text_of(node));
        if file.path.is_empty() {
            return Err(ParseError::warning("File element is missing a path"));
        }

        // A missing file stays in the model, flagged invalid.
        file.valid = kernel.current_dir().join(&file.path).is_file();
        if !file.valid {
            tracing::warn!("file does not exist: {}", file.path);
        }

        if file.path.to_lowercase().ends_with(".settings") {
            file.sub_type = Some(SubType::Settings);
            file.build_action = Some(BuildAction::None);
        }

        Ok(file)
    }

    /// The declared build action, or one derived from the file extension.
    pub fn build_action(&self) -> BuildAction {
        self.build_action.unwrap_or_else(|| default_build_action(&self.path))
    }

    /// The declared sub-type, or one derived from the file name.
    pub fn sub_type(&self) -> SubType {
        self.sub_type.unwrap_or_else(|| default_sub_type(&self.path))
    }

    pub fn copy_to_output(&self) -> CopyToOutput {
        self.copy_to_output
    }

    pub fn is_link(&self) -> bool {
        self.is_link
    }

    pub fn link_path(&self) -> &str {
        &self.link_path
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn preserve_path(&self) -> bool {
        self.preserve_path
    }

    /// Whether the path existed on disk when the declaration parsed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

// ─── ExcludeNode ─────────────────────────────────────────────────────────────

/// A regex rule suppressing files from an enclosing `<Match>`.
#[derive(Debug, Clone, Default)]
pub struct ExcludeNode {
    pub name: String,
    pub pattern: String,
}

impl ExcludeNode {
    pub fn parse(node: &roxmltree::Node) -> Result<ExcludeNode, ParseError> {
        let pattern = attr(node, "pattern", "");
        if pattern.is_empty() {
            return Err(ParseError::warning(
                "Exclude element requires a 'pattern' attribute",
            ));
        }
        Ok(ExcludeNode {
            name: attr(node, "name", ""),
            pattern,
        })
    }
}

// ─── MatchNode ───────────────────────────────────────────────────────────────

/// A pattern-expanded file set entry (`<Match>`). Expansion happens at parse
/// time; the resolved files share this entry's metadata.
#[derive(Debug, Clone, Default)]
pub struct MatchNode {
    files: Vec<String>,
    pub path: String,
    pub pattern: String,
    pub recurse: bool,
    pub use_regex: bool,
    destination: String,
    build_action: Option<BuildAction>,
    sub_type: Option<SubType>,
    resource_name: String,
    copy_to_output: CopyToOutput,
    is_link: bool,
    link_path: String,
    preserve_path: bool,
    exclusions: Vec<ExcludeNode>,
}

impl MatchNode {
    pub fn parse(
        kernel: &mut Kernel,
        node: &roxmltree::Node,
        project: Option<&str>,
    ) -> Result<MatchNode, ParseError> {
        let mut entry = MatchNode::default();
        entry.path = attr(node, "path", ".");
        entry.pattern = attr(node, "pattern", "*");
        entry.recurse = bool_attr(node, "recurse", false);
        entry.use_regex = bool_attr(node, "useRegex", false);
        entry.build_action = parse_enum_attr(node, "buildAction", BuildAction::parse);
        entry.resource_name = attr(node, "resourceName", "");
        entry.copy_to_output =
            parse_enum_attr(node, "copyToOutput", CopyToOutput::parse).unwrap_or_default();
        entry.is_link = bool_attr(node, "link", false);
        if entry.is_link {
            entry.link_path = attr(node, "linkPath", "");
        }
        entry.preserve_path = bool_attr(node, "preservePath", false);
        if entry.build_action == Some(BuildAction::Copy) {
            entry.destination = attr(node, "destination", "");
        }
        if entry.path.is_empty() {
            entry.path = ".".to_string();
        }

        let dir = kernel.current_dir().join(&entry.path);
        if !dir.is_dir() {
            return Err(ParseError::warning(format!(
                "match path does not exist: {}",
                entry.path
            )));
        }

        let pattern = if entry.use_regex {
            MatchPattern::regex(&entry.pattern)?
        } else {
            MatchPattern::glob(&entry.pattern)?
        };

        for child in node.children().filter(|n| n.is_element()) {
            if let Some(crate::kernel::ParsedNode::Exclude(exclude)) =
                kernel.parse_node(&child, Scope::Other)?
            {
                entry.exclusions.push(exclude);
            }
        }
        let mut exclusions = Vec::with_capacity(entry.exclusions.len());
        for exclude in &entry.exclusions {
            let regex = Regex::new(&exclude.pattern).map_err(|err| {
                ParseError::warning(format!("could not compile exclusion regex: {err}"))
            })?;
            exclusions.push(regex);
        }

        let prefix = entry.path.replace('\\', "/");
        let prefix = prefix.trim_end_matches('/');
        entry.files = scan_files(
            &dir,
            prefix,
            &pattern,
            entry.recurse,
            &exclusions,
            kernel.exclude_folders(),
        );

        if entry.files.is_empty() {
            return Err(ParseError::NoMatches {
                path: entry.path.clone(),
                pattern: entry.pattern.clone(),
                project: project.map(String::from),
            });
        }

        Ok(entry)
    }

    /// The resolved file paths, in scan order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn build_action_for(&self, path: &str) -> BuildAction {
        self.build_action.unwrap_or_else(|| default_build_action(path))
    }

    pub fn sub_type_for(&self, path: &str) -> SubType {
        self.sub_type.unwrap_or_else(|| default_sub_type(path))
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn copy_to_output(&self) -> CopyToOutput {
        self.copy_to_output
    }

    pub fn is_link(&self) -> bool {
        self.is_link
    }

    pub fn link_path(&self) -> &str {
        &self.link_path
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn preserve_path(&self) -> bool {
        self.preserve_path
    }
}

fn parse_enum_attr<T>(
    node: &roxmltree::Node,
    name: &str,
    parse: fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = node.attribute(name)?;
    let value = parse(raw);
    if value.is_none() {
        tracing::warn!("invalid {name} attribute: '{raw}'");
    }
    value
}

// ─── FilesNode ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum FileOrigin {
    File(FileNode),
    Match(usize),
}

/// The resolved file set of a project or solution (`<Files>`).
///
/// Keyed by resolved path, insertion-ordered, deduplicated: the first entry
/// for a path wins and later duplicates are logged and skipped. Per-file
/// metadata lookups fall back to the declaration that produced the file.
#[derive(Debug, Clone, Default)]
pub struct FilesNode {
    entries: IndexMap<String, FileOrigin>,
    matches: Vec<MatchNode>,
}

impl FilesNode {
    pub fn parse(
        kernel: &mut Kernel,
        node: &roxmltree::Node,
        project: Option<&str>,
    ) -> Result<FilesNode, ParseError> {
        let mut files = FilesNode::default();
        for child in node.children().filter(|n| n.is_element()) {
            let Some(parsed) = kernel.parse_node(&child, Scope::Files { project })? else {
                continue;
            };
            match parsed {
                crate::kernel::ParsedNode::File(file) => {
                    if files.entries.contains_key(&file.path) {
                        tracing::warn!("duplicate file entry ignored: {}", file.path);
                        continue;
                    }
                    files.entries.insert(file.path.clone(), FileOrigin::File(file));
                }
                crate::kernel::ParsedNode::Match(matched) => {
                    let index = files.matches.len();
                    for path in matched.files() {
                        if files.entries.contains_key(path) {
                            tracing::warn!("duplicate file entry ignored: {path}");
                            continue;
                        }
                        files.entries.insert(path.clone(), FileOrigin::Match(index));
                    }
                    files.matches.push(matched);
                }
                _ => {}
            }
        }
        Ok(files)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Resolved paths in declaration/scan order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn build_action(&self, path: &str) -> BuildAction {
        match self.entries.get(path) {
            Some(FileOrigin::File(f)) => f.build_action(),
            Some(FileOrigin::Match(i)) => self.matches[*i].build_action_for(path),
            None => BuildAction::Compile,
        }
    }

    pub fn sub_type(&self, path: &str) -> SubType {
        match self.entries.get(path) {
            Some(FileOrigin::File(f)) => f.sub_type(),
            Some(FileOrigin::Match(i)) => self.matches[*i].sub_type_for(path),
            None => SubType::Code,
        }
    }

    pub fn copy_to_output(&self, path: &str) -> CopyToOutput {
        match self.entries.get(path) {
            Some(FileOrigin::File(f)) => f.copy_to_output(),
            Some(FileOrigin::Match(i)) => self.matches[*i].copy_to_output(),
            None => CopyToOutput::Never,
        }
    }

    pub fn is_link(&self, path: &str) -> bool {
        match self.entries.get(path) {
            Some(FileOrigin::File(f)) => f.is_link(),
            Some(FileOrigin::Match(i)) => self.matches[*i].is_link(),
            None => false,
        }
    }

    pub fn link_path(&self, path: &str) -> &str {
        match self.entries.get(path) {
            Some(FileOrigin::File(f)) => f.link_path(),
            Some(FileOrigin::Match(i)) => self.matches[*i].link_path(),
            None => "",
        }
    }

    pub fn resource_name(&self, path: &str) -> &str {
        match self.entries.get(path) {
            Some(FileOrigin::File(f)) => f.resource_name(),
            Some(FileOrigin::Match(i)) => self.matches[*i].resource_name(),
            None => "",
        }
    }

    pub fn preserve_path(&self, path: &str) -> bool {
        match self.entries.get(path) {
            Some(FileOrigin::File(f)) => f.preserve_path(),
            Some(FileOrigin::Match(i)) => self.matches[*i].preserve_path(),
            None => false,
        }
    }

    /// The copy destination for a match-originated file, if any.
    pub fn destination(&self, path: &str) -> Option<&str> {
        match self.entries.get(path) {
            Some(FileOrigin::Match(i)) => Some(self.matches[*i].destination()),
            _ => None,
        }
    }

    /// Whether the path existed on disk at parse time. Match-originated files
    /// were listed from disk and are always valid.
    pub fn is_valid(&self, path: &str) -> bool {
        match self.entries.get(path) {
            Some(FileOrigin::File(f)) => f.is_valid(),
            Some(FileOrigin::Match(_)) => true,
            None => false,
        }
    }

    /// How many entries carry the `Copy` build action.
    pub fn copy_count(&self) -> usize {
        self.iter().filter(|p| self.build_action(p) == BuildAction::Copy).count()
    }

    /// The distinct copy destinations declared by match entries, in order.
    pub fn destinations(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for matched in &self.matches {
            let dest = matched.destination();
            if !dest.is_empty() && !seen.contains(&dest) {
                seen.push(dest);
            }
        }
        seen
    }

    /// All files expanded by matches that copy into `destination`.
    pub fn source_files(&self, destination: &str) -> Vec<&str> {
        self.matches
            .iter()
            .filter(|m| m.destination() == destination)
            .flat_map(|m| m.files().iter().map(String::as_str))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
