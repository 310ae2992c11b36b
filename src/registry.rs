use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════════════════════════
//  Node kind registry – element name → typed node constructor
// ═══════════════════════════════════════════════════════════════════════════════

/// The closed set of node kinds a build description can contain.
///
/// Each kind corresponds to one element name in the declarative schema, except
/// that a single kind may be registered under several names (`Solution` and
/// `EmbeddedSolution` both resolve to [`NodeKind::Solution`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Solution,
    Project,
    Configuration,
    Options,
    Files,
    File,
    Match,
    Exclude,
    Reference,
    ReferencePath,
    ProjectReference,
    PackageReference,
    Author,
    DatabaseProject,
    DatabaseReference,
    Cleanup,
    CleanFiles,
    Process,
}

/// Maps declarative element names to node kinds.
///
/// Built once at kernel construction. Resolution is a case-sensitive exact
/// match on the element tag name; an unresolved name is reported by the
/// parser as a warning and the element is skipped, so that descriptions
/// written against a newer schema still parse.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    entries: HashMap<&'static str, NodeKind>,
}

impl NodeRegistry {
    /// The registry holding every built-in node kind.
    pub fn builtin() -> Self {
        let mut registry = Self { entries: HashMap::new() };
        registry.register("Solution", NodeKind::Solution);
        registry.register("EmbeddedSolution", NodeKind::Solution);
        registry.register("Project", NodeKind::Project);
        registry.register("Configuration", NodeKind::Configuration);
        registry.register("Options", NodeKind::Options);
        registry.register("Files", NodeKind::Files);
        registry.register("File", NodeKind::File);
        registry.register("Match", NodeKind::Match);
        registry.register("Exclude", NodeKind::Exclude);
        registry.register("Reference", NodeKind::Reference);
        registry.register("ReferencePath", NodeKind::ReferencePath);
        registry.register("ProjectReference", NodeKind::ProjectReference);
        registry.register("PackageReference", NodeKind::PackageReference);
        registry.register("Author", NodeKind::Author);
        registry.register("DatabaseProject", NodeKind::DatabaseProject);
        registry.register("DatabaseReference", NodeKind::DatabaseReference);
        registry.register("Cleanup", NodeKind::Cleanup);
        registry.register("CleanFiles", NodeKind::CleanFiles);
        registry.register("Process", NodeKind::Process);
        registry
    }

    /// Register `kind` under `name`. Later registrations win.
    pub fn register(&mut self, name: &'static str, kind: NodeKind) {
        self.entries.insert(name, kind);
    }

    /// Resolve an element tag name to its node kind.
    pub fn resolve(&self, name: &str) -> Option<NodeKind> {
        self.entries.get(name).copied()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solution_registers_under_both_names() {
        let registry = NodeRegistry::builtin();
        assert_eq!(registry.resolve("Solution"), Some(NodeKind::Solution));
        assert_eq!(registry.resolve("EmbeddedSolution"), Some(NodeKind::Solution));
    }

    #[test]
    fn resolution_is_case_sensitive() {
        let registry = NodeRegistry::builtin();
        assert_eq!(registry.resolve("solution"), None);
        assert_eq!(registry.resolve("PROJECT"), None);
        assert_eq!(registry.resolve("NoSuchNode"), None);
    }

    #[test]
    fn later_registration_wins() {
        let mut registry = NodeRegistry::builtin();
        registry.register("Reference", NodeKind::PackageReference);
        assert_eq!(registry.resolve("Reference"), Some(NodeKind::PackageReference));
    }
}
