use std::path::PathBuf;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::error::ParseError;
use crate::files::FilesNode;
use crate::kernel::{Kernel, ParsedNode, Scope, attr, bool_attr, opt_attr, text_of};
use crate::options::OptionsNode;

// ═══════════════════════════════════════════════════════════════════════════════
//  Enumerations
// ═══════════════════════════════════════════════════════════════════════════════

/// What kind of artifact a project builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectType {
    /// Console executable.
    #[default]
    Exe,
    /// Windowed executable.
    WinExe,
    Library,
    Web,
}

impl ProjectType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Exe" => Some(ProjectType::Exe),
            "WinExe" => Some(ProjectType::WinExe),
            "Library" => Some(ProjectType::Library),
            "Web" => Some(ProjectType::Web),
            _ => None,
        }
    }
}

/// The CLR flavor a project targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClrRuntime {
    #[default]
    Microsoft,
    Mono,
}

impl ClrRuntime {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Microsoft" => Some(ClrRuntime::Microsoft),
            "Mono" => Some(ClrRuntime::Mono),
            _ => None,
        }
    }
}

/// Target framework versions a project can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[allow(non_camel_case_types)]
pub enum FrameworkVersion {
    V2_0,
    V3_0,
    V3_5,
    V4_0,
    V4_5,
    V4_5_1,
    V4_5_2,
    V4_6,
    V4_6_1,
    V4_6_2,
    V4_7,
    V4_7_1,
    V4_7_2,
    V4_8,
    NetStandard2_0,
    Net5_0,
    Net6_0,
    Net7_0,
}

impl FrameworkVersion {
    /// Case-insensitive parse of the declared version tag.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "v2_0" => Some(FrameworkVersion::V2_0),
            "v3_0" => Some(FrameworkVersion::V3_0),
            "v3_5" => Some(FrameworkVersion::V3_5),
            "v4_0" => Some(FrameworkVersion::V4_0),
            "v4_5" => Some(FrameworkVersion::V4_5),
            "v4_5_1" => Some(FrameworkVersion::V4_5_1),
            "v4_5_2" => Some(FrameworkVersion::V4_5_2),
            "v4_6" => Some(FrameworkVersion::V4_6),
            "v4_6_1" => Some(FrameworkVersion::V4_6_1),
            "v4_6_2" => Some(FrameworkVersion::V4_6_2),
            "v4_7" => Some(FrameworkVersion::V4_7),
            "v4_7_1" => Some(FrameworkVersion::V4_7_1),
            "v4_7_2" => Some(FrameworkVersion::V4_7_2),
            "v4_8" => Some(FrameworkVersion::V4_8),
            "netstandard2_0" => Some(FrameworkVersion::NetStandard2_0),
            "net5_0" => Some(FrameworkVersion::Net5_0),
            "net6_0" => Some(FrameworkVersion::Net6_0),
            "net7_0" => Some(FrameworkVersion::Net7_0),
            _ => None,
        }
    }

    /// The conditional-compilation symbol for this version (`NET48`, …).
    pub fn conditional_define(&self) -> &'static str {
        match self {
            FrameworkVersion::V2_0 => "NET20",
            FrameworkVersion::V3_0 => "NET30",
            FrameworkVersion::V3_5 => "NET35",
            FrameworkVersion::V4_0 => "NET40",
            FrameworkVersion::V4_5 => "NET45",
            FrameworkVersion::V4_5_1 => "NET451",
            FrameworkVersion::V4_5_2 => "NET452",
            FrameworkVersion::V4_6 => "NET46",
            FrameworkVersion::V4_6_1 => "NET461",
            FrameworkVersion::V4_6_2 => "NET462",
            FrameworkVersion::V4_7 => "NET47",
            FrameworkVersion::V4_7_1 => "NET471",
            FrameworkVersion::V4_7_2 => "NET472",
            FrameworkVersion::V4_8 => "NET48",
            FrameworkVersion::NetStandard2_0 => "NETSTANDARD2_0",
            FrameworkVersion::Net5_0 => "NET5_0",
            FrameworkVersion::Net6_0 => "NET6_0",
            FrameworkVersion::Net7_0 => "NET7_0",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  ConfigurationNode
// ═══════════════════════════════════════════════════════════════════════════════

/// A named build variant scoped to a platform (`<Configuration>`).
#[derive(Debug, Clone)]
pub struct ConfigurationNode {
    name: String,
    platform: String,
    pub options: OptionsNode,
}

impl Default for ConfigurationNode {
    fn default() -> Self {
        ConfigurationNode {
            name: "unknown".to_string(),
            platform: "AnyCPU".to_string(),
            options: OptionsNode::default(),
        }
    }
}

impl ConfigurationNode {
    /// Parse a `<Configuration>` element.
    ///
    /// When the configuration is attached directly to a solution, the
    /// solution's options seed this configuration's options before the
    /// element's own `<Options>` children apply on top.
    pub fn parse(
        kernel: &mut Kernel,
        node: &roxmltree::Node,
        parent_options: Option<&OptionsNode>,
    ) -> Result<ConfigurationNode, ParseError> {
        let mut conf = ConfigurationNode::default();
        if let Some(options) = parent_options {
            options.copy_to(&mut conf.options);
        }
        conf.name = attr(node, "name", "unknown");
        conf.set_platform(&attr(node, "platform", "AnyCPU"));

        for child in node.children().filter(|n| n.is_element()) {
            if let Some(ParsedNode::Options(options)) = kernel.parse_node(&child, Scope::Other)? {
                options.copy_to(&mut conf.options);
            }
        }
        Ok(conf)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalized platform: `x86`, `x64`, `Itanium`, or `AnyCPU`.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn set_platform(&mut self, raw: &str) {
        self.platform = match raw.to_lowercase().as_str() {
            "x86" => "x86",
            "x64" => "x64",
            "itanium" => "Itanium",
            _ => "AnyCPU",
        }
        .to_string();
    }

    /// The identity key in a configuration table.
    pub fn key(&self) -> String {
        format!("{}|{}", self.name, self.platform)
    }

    /// A configuration named `all` broadcasts its options instead of standing
    /// on its own.
    pub fn is_broadcast(&self) -> bool {
        self.name.eq_ignore_ascii_case("all")
    }

    /// Copy this configuration's explicitly-set options onto `target`.
    pub fn copy_to(&self, target: &mut ConfigurationNode) {
        self.options.copy_to(&mut target.options);
    }
}

/// Merge a parsed configuration into a configuration table.
///
/// An `all` configuration first broadcasts onto every entry present at this
/// moment; entries inserted later never see it. The configuration then
/// merges into the entry matching its own key, or is inserted as a new entry.
pub(crate) fn apply_configuration(
    table: &mut IndexMap<String, ConfigurationNode>,
    conf: ConfigurationNode,
) {
    if conf.is_broadcast() {
        for existing in table.values_mut() {
            conf.copy_to(existing);
        }
    }
    match table.get_mut(&conf.key()) {
        Some(existing) => conf.copy_to(existing),
        None => {
            table.insert(conf.key(), conf);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  References & authors
// ═══════════════════════════════════════════════════════════════════════════════

/// An assembly reference (`<Reference>`).
#[derive(Debug, Clone, Default)]
pub struct ReferenceNode {
    pub name: String,
    pub path: Option<String>,
    pub version: Option<String>,
    /// Tri-state: `None` when the declaration did not specify `localCopy`.
    pub local_copy: Option<bool>,
}

impl ReferenceNode {
    pub fn parse(node: &roxmltree::Node) -> Result<ReferenceNode, ParseError> {
        let local_copy = match node.attribute("localCopy") {
            None => None,
            Some(raw) if raw.trim().eq_ignore_ascii_case("true") => Some(true),
            Some(raw) if raw.trim().eq_ignore_ascii_case("false") => Some(false),
            Some(raw) => {
                tracing::warn!("invalid localCopy attribute: '{raw}'");
                None
            }
        };
        Ok(ReferenceNode {
            name: attr(node, "name", "unknown"),
            path: opt_attr(node, "path"),
            version: opt_attr(node, "version"),
            local_copy,
        })
    }
}

/// An additional assembly search path (`<ReferencePath>`), given as text.
#[derive(Debug, Clone, Default)]
pub struct ReferencePathNode {
    pub path: String,
}

impl ReferencePathNode {
    pub fn parse(kernel: &Kernel, node: &roxmltree::Node) -> Result<ReferencePathNode, ParseError> {
        let path = kernel.interpolate(&text_of(node));
        if path.is_empty() {
            return Err(ParseError::warning("ReferencePath element is missing a path"));
        }
        Ok(ReferencePathNode { path })
    }
}

/// A project-to-project reference (`<ProjectReference>`).
#[derive(Debug, Clone, Default)]
pub struct ProjectReferenceNode {
    pub name: String,
    pub path: Option<String>,
}

impl ProjectReferenceNode {
    pub fn parse(node: &roxmltree::Node) -> Result<ProjectReferenceNode, ParseError> {
        Ok(ProjectReferenceNode {
            name: attr(node, "name", "unknown"),
            path: opt_attr(node, "path"),
        })
    }
}

/// A package reference (`<PackageReference>`).
#[derive(Debug, Clone, Default)]
pub struct PackageReferenceNode {
    pub name: String,
    pub version: Option<String>,
}

impl PackageReferenceNode {
    pub fn parse(node: &roxmltree::Node) -> Result<PackageReferenceNode, ParseError> {
        Ok(PackageReferenceNode {
            name: attr(node, "name", "unknown"),
            version: opt_attr(node, "version"),
        })
    }
}

/// A project author (`<Author>`), given as text.
#[derive(Debug, Clone, Default)]
pub struct AuthorNode {
    pub name: String,
}

impl AuthorNode {
    pub fn parse(node: &roxmltree::Node) -> Result<AuthorNode, ParseError> {
        let name = text_of(node);
        if name.is_empty() {
            return Err(ParseError::warning("Author element is missing a name"));
        }
        Ok(AuthorNode { name })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Cleanup & process directives
// ═══════════════════════════════════════════════════════════════════════════════

/// A cleanup file pattern (`<CleanFiles pattern="..."/>`).
#[derive(Debug, Clone, Default)]
pub struct CleanFilesNode {
    pub pattern: String,
}

impl CleanFilesNode {
    pub fn parse(node: &roxmltree::Node) -> Result<CleanFilesNode, ParseError> {
        let pattern = attr(node, "pattern", "").trim().to_string();
        if pattern.is_empty() {
            return Err(ParseError::warning(
                "CleanFiles element requires a 'pattern' attribute",
            ));
        }
        Ok(CleanFilesNode { pattern })
    }
}

/// The solution cleanup directive (`<Cleanup>`). At most one per solution.
#[derive(Debug, Clone, Default)]
pub struct CleanupNode {
    pub clean_files: Vec<CleanFilesNode>,
}

impl CleanupNode {
    pub fn parse(kernel: &mut Kernel, node: &roxmltree::Node) -> Result<CleanupNode, ParseError> {
        let mut cleanup = CleanupNode::default();
        for child in node.children().filter(|n| n.is_element()) {
            if let Some(ParsedNode::CleanFiles(entry)) = kernel.parse_node(&child, Scope::Other)? {
                cleanup.clean_files.push(entry);
            }
        }
        Ok(cleanup)
    }
}

/// A splice directive (`<Process>`): parse another build document and merge
/// its solutions into the enclosing scope.
#[derive(Debug, Clone, Default)]
pub struct ProcessNode {
    pub path: PathBuf,
    pub is_valid: bool,
}

impl ProcessNode {
    pub fn parse(kernel: &Kernel, node: &roxmltree::Node) -> Result<ProcessNode, ParseError> {
        let declared = kernel.interpolate(&text_of(node));
        match kernel.resolve_file(&declared) {
            Ok(path) => Ok(ProcessNode { path, is_valid: true }),
            Err(_) => {
                tracing::warn!("could not find build file for processing: {declared}");
                Ok(ProcessNode {
                    path: PathBuf::from(declared),
                    is_valid: false,
                })
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Database projects
// ═══════════════════════════════════════════════════════════════════════════════

/// A database connection reference (`<DatabaseReference>`).
#[derive(Debug, Clone)]
pub struct DatabaseReferenceNode {
    pub name: String,
    pub provider_id: Uuid,
    pub connection_string: Option<String>,
}

impl DatabaseReferenceNode {
    pub fn parse(node: &roxmltree::Node) -> Result<DatabaseReferenceNode, ParseError> {
        let provider_id = match node.attribute("providerName") {
            Some(provider) => provider_id_of(provider)?,
            None => match node.attribute("providerId") {
                Some(raw) => Uuid::parse_str(raw.trim_matches(['{', '}'])).map_err(|_| {
                    ParseError::warning(format!("invalid providerId attribute: '{raw}'"))
                })?,
                None => Uuid::nil(),
            },
        };
        Ok(DatabaseReferenceNode {
            name: attr(node, "name", "unknown"),
            provider_id,
            connection_string: opt_attr(node, "connectionString"),
        })
    }
}

/// Map a known ADO provider name to its designer GUID. An unknown name is a
/// fatal configuration error.
fn provider_id_of(provider: &str) -> Result<Uuid, ParseError> {
    let id = match provider {
        "Microsoft.SqlServerCe.Client" => "7C602B5B-ACCB-4ACD-9DC0-CA66388C1533",
        "System.Data.OleDb" => "7F041D59-D76A-44ED-9AA2-FBF6B0548B80",
        "System.Data.OracleClient" => "8F5C5018-AE09-42CF-B2CC-2CCCC7CFC2BB",
        "System.Data.SqlClient" => "91510608-8809-4020-8897-FBA057E22D54",
        "System.Data.Odbc" => "C3D4F4CE-2C48-4381-B4D6-34FA50C51C86",
        _ => return Err(ParseError::UnknownProvider(provider.to_string())),
    };
    // The table holds well-formed GUIDs.
    Ok(Uuid::parse_str(id).unwrap_or_default())
}

/// A database project (`<DatabaseProject>`).
#[derive(Debug, Clone, Default)]
pub struct DatabaseProjectNode {
    pub name: String,
    pub path: String,
    pub full_path: PathBuf,
    pub authors: Vec<AuthorNode>,
    references: Vec<DatabaseReferenceNode>,
}

impl DatabaseProjectNode {
    pub fn parse(kernel: &mut Kernel, node: &roxmltree::Node) -> Result<DatabaseProjectNode, ParseError> {
        let mut project = DatabaseProjectNode::default();
        project.name = attr(node, "name", "unknown");
        project.path = attr(node, "path", &project.name);
        project.full_path = kernel.resolve_dir(&project.path)?;

        kernel.push_dir(project.full_path.clone());
        let outcome = project.parse_children(kernel, node);
        kernel.pop_dir();
        outcome?;
        Ok(project)
    }

    fn parse_children(&mut self, kernel: &mut Kernel, node: &roxmltree::Node) -> Result<(), ParseError> {
        for child in node.children().filter(|n| n.is_element()) {
            let Some(parsed) = kernel.parse_node(&child, Scope::Other)? else {
                continue;
            };
            match parsed {
                ParsedNode::Author(author) => self.authors.push(author),
                ParsedNode::DatabaseReference(reference) => self.references.push(reference),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn references(&self) -> &[DatabaseReferenceNode] {
        &self.references
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  ProjectNode
// ═══════════════════════════════════════════════════════════════════════════════

/// A single compilable unit (`<Project>`).
#[derive(Debug, Clone)]
pub struct ProjectNode {
    pub name: String,
    pub path: String,
    pub full_path: PathBuf,
    pub filter_groups: String,
    pub version: String,
    pub app_icon: String,
    pub application_manifest: String,
    pub config_file: String,
    pub designer_folder: String,
    /// Defaults to the project name.
    pub assembly_name: String,
    /// Defaults to the project name.
    pub root_namespace: String,
    pub language: String,
    pub project_type: ProjectType,
    pub runtime: ClrRuntime,
    pub framework: FrameworkVersion,
    /// Stable across repeated parses: derived from the name when not declared.
    pub guid: Uuid,
    pub startup_object: String,
    pub copy_local_lock_file_assemblies: bool,
    pub generate_assembly_info_file: bool,
    pub debug_start_parameters: String,
    pub files: FilesNode,
    pub authors: Vec<AuthorNode>,
    configurations: IndexMap<String, ConfigurationNode>,
    reference_paths: Vec<ReferencePathNode>,
    references: Vec<ReferenceNode>,
    project_references: Vec<ProjectReferenceNode>,
    package_references: Vec<PackageReferenceNode>,
}

impl Default for ProjectNode {
    fn default() -> Self {
        ProjectNode {
            name: "unknown".to_string(),
            path: String::new(),
            full_path: PathBuf::new(),
            filter_groups: String::new(),
            version: String::new(),
            app_icon: String::new(),
            application_manifest: String::new(),
            config_file: String::new(),
            designer_folder: String::new(),
            assembly_name: String::new(),
            root_namespace: String::new(),
            language: "C#".to_string(),
            project_type: ProjectType::Exe,
            runtime: ClrRuntime::Microsoft,
            framework: FrameworkVersion::V2_0,
            guid: Uuid::nil(),
            startup_object: String::new(),
            copy_local_lock_file_assemblies: true,
            generate_assembly_info_file: false,
            debug_start_parameters: String::new(),
            files: FilesNode::default(),
            authors: Vec::new(),
            configurations: IndexMap::new(),
            reference_paths: Vec::new(),
            references: Vec::new(),
            project_references: Vec::new(),
            package_references: Vec::new(),
        }
    }
}

impl ProjectNode {
    /// The GUID derived from a project name. Name-based, so the same name
    /// produces the same GUID on every parse.
    pub fn derive_guid(name: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
    }

    /// Parse a `<Project>` element.
    ///
    /// The enclosing solution's state feeds in before children parse: its
    /// configuration templates are cloned into this project's table, and its
    /// framework settings participate in the version precedence (explicit
    /// per-project attribute > solution forced > solution default > `v2_0`).
    pub fn parse(
        kernel: &mut Kernel,
        node: &roxmltree::Node,
        parent: Option<&SolutionNode>,
    ) -> Result<ProjectNode, ParseError> {
        let mut project = ProjectNode::default();
        if let Some(solution) = parent {
            for (key, conf) in solution.configurations_table() {
                project.configurations.insert(key.clone(), conf.clone());
            }
        }

        project.name = attr(node, "name", "unknown");
        project.path = attr(node, "path", "");
        project.filter_groups = attr(node, "filterGroups", "");
        project.version = attr(node, "version", "");
        project.app_icon = attr(node, "icon", "");
        project.application_manifest = attr(node, "appmanifest", "");
        project.config_file = attr(node, "configFile", "");
        project.designer_folder = attr(node, "designerFolder", "");
        project.assembly_name = attr(node, "assemblyName", "");
        project.language = attr(node, "language", "C#");
        if let Some(raw) = opt_attr(node, "type") {
            match ProjectType::parse(&raw) {
                Some(t) => project.project_type = t,
                None => tracing::warn!("invalid type attribute: '{raw}'"),
            }
        }
        if let Some(raw) = opt_attr(node, "runtime") {
            match ClrRuntime::parse(&raw) {
                Some(r) => project.runtime = r,
                None => tracing::warn!("invalid runtime attribute: '{raw}'"),
            }
        }
        project.startup_object = attr(node, "startupObject", "");
        project.root_namespace = attr(node, "rootNamespace", "");
        project.copy_local_lock_file_assemblies = bool_attr(node, "copyDependencies", true);
        project.generate_assembly_info_file =
            bool_attr(node, "generateAssemblyInfoFile", false);
        project.debug_start_parameters = attr(node, "debugStartParameters", "");

        let explicit = opt_attr(node, "forceFrameworkVersion")
            .or_else(|| opt_attr(node, "frameworkVersion"))
            .and_then(|raw| FrameworkVersion::parse(&raw));
        project.framework = explicit
            .or(parent.and_then(|s| s.forced_framework))
            .or(parent.and_then(|s| s.default_framework))
            .unwrap_or(FrameworkVersion::V2_0);

        project.guid = match opt_attr(node, "guid") {
            Some(raw) => Uuid::parse_str(raw.trim_matches(['{', '}'])).unwrap_or_else(|_| {
                tracing::warn!("invalid guid attribute: '{raw}'");
                Self::derive_guid(&project.name)
            }),
            None => Self::derive_guid(&project.name),
        };

        if project.assembly_name.is_empty() {
            project.assembly_name = project.name.clone();
        }
        if project.root_namespace.is_empty() {
            project.root_namespace = project.name.clone();
        }

        project.full_path = kernel.resolve_dir(&project.path)?;
        kernel.push_dir(project.full_path.clone());
        let outcome = project.parse_children(kernel, node);
        kernel.pop_dir();
        outcome?;
        Ok(project)
    }

    fn parse_children(&mut self, kernel: &mut Kernel, node: &roxmltree::Node) -> Result<(), ParseError> {
        for child in node.children().filter(|n| n.is_element()) {
            let Some(parsed) = kernel.parse_node(&child, Scope::Project(&*self))? else {
                continue;
            };
            match parsed {
                ParsedNode::Configuration(conf) => {
                    apply_configuration(&mut self.configurations, conf);
                }
                ParsedNode::ReferencePath(path) => self.reference_paths.push(path),
                ParsedNode::Reference(reference) => self.references.push(reference),
                ParsedNode::PackageReference(package) => self.package_references.push(package),
                ParsedNode::ProjectReference(reference) => self.project_references.push(reference),
                ParsedNode::Author(author) => self.authors.push(author),
                ParsedNode::Files(files) => self.files = files,
                _ => {}
            }
        }
        Ok(())
    }

    /// Configurations sorted by name for emission.
    pub fn configurations(&self) -> Vec<&ConfigurationNode> {
        let mut confs: Vec<&ConfigurationNode> = self.configurations.values().collect();
        confs.sort_by(|a, b| a.key().cmp(&b.key()));
        confs
    }

    /// Look up a configuration by its `name|platform` key.
    pub fn configuration(&self, key: &str) -> Option<&ConfigurationNode> {
        self.configurations.get(key)
    }

    pub(crate) fn configurations_table(&self) -> &IndexMap<String, ConfigurationNode> {
        &self.configurations
    }

    /// Assembly references sorted by name.
    pub fn references(&self) -> Vec<&ReferenceNode> {
        let mut refs: Vec<&ReferenceNode> = self.references.iter().collect();
        refs.sort_by(|a, b| a.name.cmp(&b.name));
        refs
    }

    /// Reference search paths, in declaration order.
    pub fn reference_paths(&self) -> &[ReferencePathNode] {
        &self.reference_paths
    }

    /// Project references sorted by name.
    pub fn project_references(&self) -> Vec<&ProjectReferenceNode> {
        let mut refs: Vec<&ProjectReferenceNode> = self.project_references.iter().collect();
        refs.sort_by(|a, b| a.name.cmp(&b.name));
        refs
    }

    /// Package references sorted by name.
    pub fn package_references(&self) -> Vec<&PackageReferenceNode> {
        let mut refs: Vec<&PackageReferenceNode> = self.package_references.iter().collect();
        refs.sort_by(|a, b| a.name.cmp(&b.name));
        refs
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  SolutionNode
// ═══════════════════════════════════════════════════════════════════════════════

/// The top-level grouping of projects and nested solutions
/// (`<Solution>` / `<EmbeddedSolution>`).
#[derive(Debug, Clone)]
pub struct SolutionNode {
    pub name: String,
    pub path: String,
    pub full_path: PathBuf,
    pub version: String,
    /// Defaults to the first configuration parsed when not declared.
    pub active_config: Option<String>,
    pub guid: Uuid,
    pub default_framework: Option<FrameworkVersion>,
    pub forced_framework: Option<FrameworkVersion>,
    pub options: OptionsNode,
    pub files: FilesNode,
    pub cleanup: Option<CleanupNode>,
    configurations: IndexMap<String, ConfigurationNode>,
    projects: IndexMap<String, ProjectNode>,
    project_order: Vec<String>,
    solutions: IndexMap<String, SolutionNode>,
    database_projects: IndexMap<String, DatabaseProjectNode>,
}

impl Default for SolutionNode {
    fn default() -> Self {
        SolutionNode {
            name: "unknown".to_string(),
            path: String::new(),
            full_path: PathBuf::new(),
            version: "1.0.0".to_string(),
            active_config: None,
            guid: Uuid::new_v4(),
            default_framework: None,
            forced_framework: None,
            options: OptionsNode::default(),
            files: FilesNode::default(),
            cleanup: None,
            configurations: IndexMap::new(),
            projects: IndexMap::new(),
            project_order: Vec::new(),
            solutions: IndexMap::new(),
            database_projects: IndexMap::new(),
        }
    }
}

impl SolutionNode {
    /// Parse a `<Solution>` or `<EmbeddedSolution>` element.
    ///
    /// A nested solution clones the enclosing solution's configuration
    /// templates at attach time, before its own children parse, so local
    /// configurations declared later override the inherited ones.
    pub fn parse(
        kernel: &mut Kernel,
        node: &roxmltree::Node,
        parent: Option<&SolutionNode>,
    ) -> Result<SolutionNode, ParseError> {
        let mut solution = SolutionNode::default();
        if let Some(parent) = parent {
            for (key, conf) in &parent.configurations {
                solution.configurations.insert(key.clone(), conf.clone());
            }
        }

        solution.name = attr(node, "name", "unknown");
        solution.active_config = opt_attr(node, "activeConfig");
        solution.path = attr(node, "path", "");
        solution.version = attr(node, "version", "1.0.0");
        solution.forced_framework =
            opt_attr(node, "forceFrameworkVersion").and_then(|raw| FrameworkVersion::parse(&raw));
        if solution.forced_framework.is_none() {
            solution.default_framework =
                opt_attr(node, "frameworkVersion").and_then(|raw| FrameworkVersion::parse(&raw));
        }

        solution.full_path = kernel.resolve_dir(&solution.path)?;
        kernel.push_dir(solution.full_path.clone());
        let outcome = solution.parse_children(kernel, node);
        kernel.pop_dir();
        outcome?;
        Ok(solution)
    }

    fn parse_children(&mut self, kernel: &mut Kernel, node: &roxmltree::Node) -> Result<(), ParseError> {
        for child in node.children().filter(|n| n.is_element()) {
            let Some(parsed) = kernel.parse_node(&child, Scope::Solution(&*self))? else {
                continue;
            };
            match parsed {
                ParsedNode::Options(options) => self.options = options,
                ParsedNode::Files(files) => self.files = files,
                ParsedNode::Configuration(conf) => {
                    if self.active_config.is_none() {
                        self.active_config = Some(conf.name().to_string());
                    }
                    apply_configuration(&mut self.configurations, conf);
                }
                ParsedNode::Project(project) => {
                    let name = project.name.clone();
                    if self.projects.insert(name.clone(), project).is_none() {
                        self.project_order.push(name);
                    }
                }
                ParsedNode::Solution(nested) => {
                    self.solutions.insert(nested.name.clone(), nested);
                }
                ParsedNode::Process(process) => {
                    if !process.is_valid {
                        continue;
                    }
                    // A fatal error inside the spliced document aborts only
                    // that splice.
                    match kernel.splice_document(&process.path) {
                        Ok(spliced) => {
                            for nested in spliced {
                                self.solutions.insert(nested.name.clone(), nested);
                            }
                        }
                        Err(err) => tracing::error!("{err}"),
                    }
                }
                ParsedNode::DatabaseProject(db) => {
                    self.database_projects.insert(db.name.clone(), db);
                }
                ParsedNode::Cleanup(cleanup) => {
                    if self.cleanup.is_some() {
                        return Err(ParseError::DuplicateCleanup(self.name.clone()));
                    }
                    self.cleanup = Some(cleanup);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Configuration templates in declaration order.
    pub fn configurations(&self) -> impl Iterator<Item = &ConfigurationNode> {
        self.configurations.values()
    }

    /// Look up a configuration template by its `name|platform` key.
    pub fn configuration(&self, key: &str) -> Option<&ConfigurationNode> {
        self.configurations.get(key)
    }

    pub(crate) fn configurations_table(&self) -> &IndexMap<String, ConfigurationNode> {
        &self.configurations
    }

    /// Projects sorted by name.
    pub fn projects(&self) -> Vec<&ProjectNode> {
        let mut projects: Vec<&ProjectNode> = self.projects.values().collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        projects
    }

    /// Projects in declaration order, for emitters that preserve it.
    pub fn projects_in_order(&self) -> impl Iterator<Item = &ProjectNode> {
        self.project_order.iter().filter_map(|name| self.projects.get(name))
    }

    pub fn project(&self, name: &str) -> Option<&ProjectNode> {
        self.projects.get(name)
    }

    /// Nested solutions in declaration order.
    pub fn solutions(&self) -> impl Iterator<Item = &SolutionNode> {
        self.solutions.values()
    }

    pub fn solution(&self, name: &str) -> Option<&SolutionNode> {
        self.solutions.get(name)
    }

    pub fn database_projects(&self) -> impl Iterator<Item = &DatabaseProjectNode> {
        self.database_projects.values()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
