use std::collections::HashSet;
use std::fs;
use std::path::Path;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::error::ParseError;

// ═══════════════════════════════════════════════════════════════════════════════
//  File pattern resolver – expand a Match declaration against the filesystem
// ═══════════════════════════════════════════════════════════════════════════════

/// A compiled match pattern: either a shell-style glob applied per directory
/// to file names, or a regex applied to the accumulated relative path.
#[derive(Debug, Clone)]
pub enum MatchPattern {
    Glob(GlobMatcher),
    Regex(Regex),
}

impl MatchPattern {
    /// Compile a shell-style glob. A malformed glob is a recoverable warning.
    pub fn glob(pattern: &str) -> Result<Self, ParseError> {
        let glob = Glob::new(pattern).map_err(|err| {
            ParseError::warning(format!("could not compile glob pattern: {err}"))
        })?;
        Ok(MatchPattern::Glob(glob.compile_matcher()))
    }

    /// Compile a match regex. A malformed regex is a recoverable warning.
    pub fn regex(pattern: &str) -> Result<Self, ParseError> {
        let regex = Regex::new(pattern).map_err(|err| {
            ParseError::warning(format!("could not compile regex pattern: {err}"))
        })?;
        Ok(MatchPattern::Regex(regex))
    }
}

/// Expand `pattern` against the directory `dir`.
///
/// `prefix` is the declared path attribute and becomes the lead component of
/// every produced file path, so results read the way they were declared
/// (`src/io.cs` for `path="src"`). Produced paths use `/` separators.
///
/// Glob mode matches file names per directory; a produced path has a leading
/// `./` stripped, and every exclusion regex is tested against the *original*
/// un-stripped path; any hit drops the file. Regex mode lists every file and
/// keeps those the match regex accepts, but drops a file when any exclusion
/// regex *fails* to match it (the polarity is inverted relative to glob mode;
/// see DESIGN.md).
///
/// Recursion descends into every subdirectory except `.svn`, `.git`, and
/// names present in `exclude_folders` (compared case-insensitively; the set
/// holds lowercase names), whether or not the current directory produced any
/// matches. Directory entries are visited in name order so the result is
/// stable for a fixed tree. Listing errors are swallowed and treated as an
/// empty directory.
pub fn scan_files(
    dir: &Path,
    prefix: &str,
    pattern: &MatchPattern,
    recurse: bool,
    exclusions: &[Regex],
    exclude_folders: &HashSet<String>,
) -> Vec<String> {
    let mut files = Vec::new();
    scan_into(dir, prefix, pattern, recurse, exclusions, exclude_folders, &mut files);
    files
}

fn scan_into(
    dir: &Path,
    prefix: &str,
    pattern: &MatchPattern,
    recurse: bool,
    exclusions: &[Regex],
    exclude_folders: &HashSet<String>,
    out: &mut Vec<String>,
) {
    // A listing failure (unreadable or vanished directory, flaky network
    // share) yields no files rather than an error.
    let mut entries: Vec<(String, bool)> = match fs::read_dir(dir) {
        Ok(read) => read
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let kind = entry.file_type().ok()?;
                let name = entry.file_name().into_string().ok()?;
                Some((name, kind.is_dir()))
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    entries.sort();

    for (name, _) in entries.iter().filter(|(_, is_dir)| !is_dir) {
        let full = join_path(prefix, name);
        match pattern {
            MatchPattern::Glob(glob) => {
                if !glob.is_match(name) {
                    continue;
                }
                if exclusions.iter().any(|ex| ex.is_match(&full)) {
                    continue;
                }
                out.push(strip_dot_prefix(&full).to_string());
            }
            MatchPattern::Regex(regex) => {
                if !regex.is_match(&full) {
                    continue;
                }
                // Kept only when every exclusion also matches.
                if exclusions.iter().any(|ex| !ex.is_match(&full)) {
                    continue;
                }
                out.push(full);
            }
        }
    }

    if !recurse {
        return;
    }
    for (name, _) in entries.iter().filter(|(_, is_dir)| *is_dir) {
        if name == ".svn" || name == ".git" {
            continue;
        }
        if exclude_folders.contains(&name.to_lowercase()) {
            continue;
        }
        scan_into(
            &dir.join(name),
            &join_path(prefix, name),
            pattern,
            recurse,
            exclusions,
            exclude_folders,
            out,
        );
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

fn strip_dot_prefix(path: &str) -> &str {
    path.strip_prefix("./")
        .or_else(|| path.strip_prefix(".\\"))
        .unwrap_or(path)
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    /// Lay out `{a.cs, b.cs, notes.txt, sub/c.cs}` under a fresh temp dir.
    fn fixture_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.cs")).unwrap();
        File::create(dir.path().join("b.cs")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub/c.cs")).unwrap();
        dir
    }

    fn no_folders() -> HashSet<String> {
        HashSet::new()
    }

    // ── Glob mode ────────────────────────────────────────────────────────

    #[test]
    fn glob_non_recursive_matches_top_level_only() {
        let dir = fixture_tree();
        let pattern = MatchPattern::glob("*.cs").unwrap();
        let files = scan_files(dir.path(), ".", &pattern, false, &[], &no_folders());
        assert_eq!(files, vec!["a.cs", "b.cs"]);
    }

    #[test]
    fn glob_recursive_descends_into_subdirectories() {
        let dir = fixture_tree();
        let pattern = MatchPattern::glob("*.cs").unwrap();
        let files = scan_files(dir.path(), ".", &pattern, true, &[], &no_folders());
        assert_eq!(files, vec!["a.cs", "b.cs", "sub/c.cs"]);
    }

    #[test]
    fn glob_exclusion_drops_matching_files() {
        let dir = fixture_tree();
        let pattern = MatchPattern::glob("*.cs").unwrap();
        let exclusions = vec![Regex::new(r"b\.cs").unwrap()];
        let files = scan_files(dir.path(), ".", &pattern, false, &exclusions, &no_folders());
        assert_eq!(files, vec!["a.cs"]);
    }

    #[test]
    fn glob_exclusion_sees_unstripped_path() {
        let dir = fixture_tree();
        let pattern = MatchPattern::glob("*.cs").unwrap();
        // Anchored to the declared "./" lead, which only the original
        // un-stripped path carries.
        let exclusions = vec![Regex::new(r"^\./b\.cs$").unwrap()];
        let files = scan_files(dir.path(), ".", &pattern, false, &exclusions, &no_folders());
        assert_eq!(files, vec!["a.cs"]);
    }

    #[test]
    fn glob_prefix_is_preserved_in_results() {
        let dir = fixture_tree();
        let pattern = MatchPattern::glob("*.cs").unwrap();
        let files = scan_files(
            &dir.path().join("sub"),
            "sub",
            &pattern,
            false,
            &[],
            &no_folders(),
        );
        assert_eq!(files, vec!["sub/c.cs"]);
    }

    // ── Regex mode ───────────────────────────────────────────────────────

    #[test]
    fn regex_mode_matches_full_relative_path() {
        let dir = fixture_tree();
        let pattern = MatchPattern::regex(r"\.cs$").unwrap();
        let files = scan_files(dir.path(), ".", &pattern, true, &[], &no_folders());
        assert_eq!(files, vec!["./a.cs", "./b.cs", "./sub/c.cs"]);
    }

    #[test]
    fn regex_mode_exclusion_polarity_is_inverted() {
        let dir = fixture_tree();
        let pattern = MatchPattern::regex(r"\.cs$").unwrap();
        // An exclusion matching only b.cs keeps b.cs and drops the rest.
        let exclusions = vec![Regex::new(r"b\.cs").unwrap()];
        let files = scan_files(dir.path(), ".", &pattern, true, &exclusions, &no_folders());
        assert_eq!(files, vec!["./b.cs"]);
    }

    // ── Recursion control ────────────────────────────────────────────────

    #[test]
    fn version_control_directories_are_skipped() {
        let dir = fixture_tree();
        fs::create_dir(dir.path().join(".git")).unwrap();
        File::create(dir.path().join(".git/d.cs")).unwrap();
        fs::create_dir(dir.path().join(".svn")).unwrap();
        File::create(dir.path().join(".svn/e.cs")).unwrap();

        let pattern = MatchPattern::glob("*.cs").unwrap();
        let files = scan_files(dir.path(), ".", &pattern, true, &[], &no_folders());
        assert_eq!(files, vec!["a.cs", "b.cs", "sub/c.cs"]);
    }

    #[test]
    fn exclude_folders_are_skipped_case_insensitively() {
        let dir = fixture_tree();
        fs::create_dir(dir.path().join("Obj")).unwrap();
        File::create(dir.path().join("Obj/gen.cs")).unwrap();

        let mut folders = HashSet::new();
        folders.insert("obj".to_string());

        let pattern = MatchPattern::glob("*.cs").unwrap();
        let files = scan_files(dir.path(), ".", &pattern, true, &[], &folders);
        assert_eq!(files, vec!["a.cs", "b.cs", "sub/c.cs"]);
    }

    #[test]
    fn recursion_continues_past_directories_without_matches() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty/deep")).unwrap();
        File::create(dir.path().join("empty/deep/x.cs")).unwrap();

        let pattern = MatchPattern::glob("*.cs").unwrap();
        let files = scan_files(dir.path(), ".", &pattern, true, &[], &no_folders());
        assert_eq!(files, vec!["empty/deep/x.cs"]);
    }

    #[test]
    fn missing_directory_yields_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = MatchPattern::glob("*").unwrap();
        let files = scan_files(
            &dir.path().join("nowhere"),
            "nowhere",
            &pattern,
            true,
            &[],
            &no_folders(),
        );
        assert!(files.is_empty());
    }

    #[test]
    fn repeated_scans_are_deterministic() {
        let dir = fixture_tree();
        let pattern = MatchPattern::glob("*.cs").unwrap();
        let first = scan_files(dir.path(), ".", &pattern, true, &[], &no_folders());
        let second = scan_files(dir.path(), ".", &pattern, true, &[], &no_folders());
        assert_eq!(first, second);
    }

    // ── Pattern compilation ──────────────────────────────────────────────

    #[test]
    fn malformed_patterns_are_warnings() {
        assert!(MatchPattern::glob("a{").unwrap_err().is_warning());
        assert!(MatchPattern::regex("(").unwrap_err().is_warning());
    }
}
