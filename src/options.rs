use std::fmt;

use crate::error::ParseError;
use crate::kernel::Kernel;

// ═══════════════════════════════════════════════════════════════════════════════
//  Options – the build-setting block carried by solutions, projects, and
//  configurations
// ═══════════════════════════════════════════════════════════════════════════════

// Every setting is an `Option<T>`: `None` means "never explicitly set" and the
// external default applies. Only `Some` fields transfer in `copy_to`, which is
// what makes the solution → project → configuration cascade work: an unset
// field at a more specific level always falls through to the less specific
// level's value.

/// A typed option value as seen through the by-name lookup surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    Bool(bool),
    Int(i32),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(v) => write!(f, "{v}"),
            OptionValue::Bool(v) => write!(f, "{v}"),
            OptionValue::Int(v) => write!(f, "{v}"),
        }
    }
}

/// The build settings block (`<Options>`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsNode {
    pub compiler_defines: Option<String>,
    pub optimize_code: Option<bool>,
    pub check_underflow_overflow: Option<bool>,
    pub allow_unsafe: Option<bool>,
    pub pre_build_event: Option<String>,
    pub post_build_event: Option<String>,
    pub pre_build_event_args: Option<String>,
    pub post_build_event_args: Option<String>,
    pub run_post_build_event: Option<String>,
    pub run_script: Option<String>,
    pub warning_level: Option<i32>,
    pub warnings_as_errors: Option<bool>,
    pub suppress_warnings: Option<String>,
    pub prefer32bit: Option<bool>,
    pub out_dir: Option<String>,
    pub enable_default_items: Option<bool>,
    pub use_common_output_directory: Option<bool>,
    pub append_target_framework_to_output_path: Option<bool>,
    pub append_runtime_identifier_to_output_path: Option<bool>,
    pub output_path: Option<String>,
    pub output_type: Option<String>,
    pub root_namespace: Option<String>,
    pub generate_documentation: Option<bool>,
    pub generate_xml_doc_file: Option<bool>,
    pub xml_doc_file: Option<String>,
    pub key_file: Option<String>,
    pub debug_information: Option<bool>,
    pub register_com_interop: Option<bool>,
    pub remove_integer_checks: Option<bool>,
    pub incremental_build: Option<bool>,
    pub base_address: Option<String>,
    pub file_alignment: Option<i32>,
    pub no_std_lib: Option<bool>,
    pub use_deps_file: Option<bool>,
    pub self_contained: Option<bool>,
    pub use_runtime_identifier: Option<bool>,
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ParseError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ParseError::warning(format!(
            "option {name} expects a boolean, got '{raw}'"
        )))
    }
}

fn parse_int(name: &str, raw: &str) -> Result<i32, ParseError> {
    raw.trim().parse::<i32>().map_err(|_| {
        ParseError::warning(format!("option {name} expects an integer, got '{raw}'"))
    })
}

macro_rules! parse_opt {
    (str, $name:literal, $raw:expr) => {
        Ok::<String, ParseError>($raw.to_string())
    };
    (bool, $name:literal, $raw:expr) => {
        parse_bool($name, $raw)
    };
    (int, $name:literal, $raw:expr) => {
        parse_int($name, $raw)
    };
}

macro_rules! wrap_opt {
    (str, $v:expr) => {
        OptionValue::Str($v)
    };
    (bool, $v:expr) => {
        OptionValue::Bool($v)
    };
    (int, $v:expr) => {
        OptionValue::Int($v)
    };
}

macro_rules! default_opt {
    (str, $d:expr) => {
        OptionValue::Str($d.to_string())
    };
    (bool, $d:expr) => {
        OptionValue::Bool($d)
    };
    (int, $d:expr) => {
        OptionValue::Int($d)
    };
}

/// Declarative table tying external option names to struct fields. The one
/// table drives parsing, by-name lookup, defaults, and `copy_to`.
macro_rules! option_table {
    ($($name:literal => $field:ident : $kind:tt = $default:expr),* $(,)?) => {
        impl OptionsNode {
            /// Set the option named `name` from its raw element text.
            ///
            /// Returns `Ok(false)` when the name is not in the option table
            /// (unknown option elements are ignored by the caller). A value
            /// that fails its typed parse is a warning that drops only this
            /// option.
            pub fn set_raw(&mut self, name: &str, raw: &str) -> Result<bool, ParseError> {
                match name {
                    $( $name => { self.$field = Some(parse_opt!($kind, $name, raw)?); } )*
                    _ => return Ok(false),
                }
                Ok(true)
            }

            /// Copy every explicitly-set field onto `target`, flagging it set
            /// there too. Unset fields never touch the target. Applying the
            /// same copy twice is a no-op the second time.
            pub fn copy_to(&self, target: &mut OptionsNode) {
                $(
                    if self.$field.is_some() {
                        target.$field = self.$field.clone();
                    }
                )*
            }

            /// Whether the option named `name` has been explicitly set.
            pub fn is_set(&self, name: &str) -> bool {
                match name {
                    $( $name => self.$field.is_some(), )*
                    _ => false,
                }
            }

            /// The explicitly-set value of the option named `name`, if any.
            pub fn get(&self, name: &str) -> Option<OptionValue> {
                match name {
                    $( $name => self.$field.clone().map(|v| wrap_opt!($kind, v)), )*
                    _ => None,
                }
            }

            /// The built-in default for the option named `name`.
            pub fn default_value(name: &str) -> Option<OptionValue> {
                match name {
                    $( $name => Some(default_opt!($kind, $default)), )*
                    _ => None,
                }
            }

            /// The set value of `name`, falling back to its default.
            pub fn value_or_default(&self, name: &str) -> Option<OptionValue> {
                self.get(name).or_else(|| Self::default_value(name))
            }

            /// The external names of every explicitly-set option, in table
            /// order.
            pub fn defined(&self) -> Vec<&'static str> {
                let mut names = Vec::new();
                $(
                    if self.$field.is_some() {
                        names.push($name);
                    }
                )*
                names
            }
        }
    };
}

option_table! {
    "CompilerDefines" => compiler_defines: str = "",
    "OptimizeCode" => optimize_code: bool = true,
    "CheckUnderflowOverflow" => check_underflow_overflow: bool = true,
    "AllowUnsafe" => allow_unsafe: bool = true,
    "PreBuildEvent" => pre_build_event: str = "",
    "PostBuildEvent" => post_build_event: str = "",
    "PreBuildEventArgs" => pre_build_event_args: str = "",
    "PostBuildEventArgs" => post_build_event_args: str = "",
    "RunPostBuildEvent" => run_post_build_event: str = "",
    "RunScript" => run_script: str = "",
    "WarningLevel" => warning_level: int = 4,
    "WarningsAsErrors" => warnings_as_errors: bool = false,
    "SuppressWarnings" => suppress_warnings: str = "",
    "Prefer32Bit" => prefer32bit: bool = false,
    "OutDir" => out_dir: str = "bin/",
    "EnableDefaultItems" => enable_default_items: bool = true,
    "UseCommonOutputDirectory" => use_common_output_directory: bool = false,
    "AppendTargetFrameworkToOutputPath" => append_target_framework_to_output_path: bool = true,
    "AppendRuntimeIdentifierToOutputPath" => append_runtime_identifier_to_output_path: bool = true,
    "OutputPath" => output_path: str = "bin/",
    "OutputType" => output_type: str = "Exe",
    "RootNamespace" => root_namespace: str = "",
    "GenerateDocumentation" => generate_documentation: bool = false,
    "GenerateXmlDocFile" => generate_xml_doc_file: bool = false,
    "XmlDocFile" => xml_doc_file: str = "",
    "KeyFile" => key_file: str = "",
    "DebugInformation" => debug_information: bool = true,
    "RegisterComInterop" => register_com_interop: bool = false,
    "RemoveIntegerChecks" => remove_integer_checks: bool = false,
    "IncrementalBuild" => incremental_build: bool = false,
    "BaseAddress" => base_address: str = "285212672",
    "FileAlignment" => file_alignment: int = 4096,
    "NoStdLib" => no_std_lib: bool = false,
    "UseDependencyFile" => use_deps_file: bool = true,
    "SelfContained" => self_contained: bool = true,
    "UseRuntimeIdentifier" => use_runtime_identifier: bool = false,
}

impl OptionsNode {
    /// Parse an `<Options>` element: each child element names an option and
    /// carries its value as text. Unknown option names are ignored; a value
    /// that fails its typed parse is logged and skipped.
    pub fn parse(kernel: &Kernel, node: &roxmltree::Node) -> OptionsNode {
        let mut options = OptionsNode::default();
        for child in node.children().filter(|n| n.is_element()) {
            let name = child.tag_name().name();
            let raw = kernel.interpolate(child.text().unwrap_or(""));
            if let Err(err) = options.set_raw(name, &raw) {
                tracing::warn!("{err}");
            }
        }
        options
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── set_raw ──────────────────────────────────────────────────────────

    #[test]
    fn set_raw_parses_typed_values() {
        let mut opts = OptionsNode::default();
        assert!(opts.set_raw("WarningLevel", "2").unwrap());
        assert!(opts.set_raw("OptimizeCode", "false").unwrap());
        assert!(opts.set_raw("CompilerDefines", "DEBUG;TRACE").unwrap());
        assert_eq!(opts.warning_level, Some(2));
        assert_eq!(opts.optimize_code, Some(false));
        assert_eq!(opts.compiler_defines.as_deref(), Some("DEBUG;TRACE"));
    }

    #[test]
    fn set_raw_ignores_unknown_names() {
        let mut opts = OptionsNode::default();
        assert!(!opts.set_raw("NoSuchOption", "1").unwrap());
        assert_eq!(opts, OptionsNode::default());
    }

    #[test]
    fn set_raw_bad_value_is_warning() {
        let mut opts = OptionsNode::default();
        let err = opts.set_raw("WarningLevel", "loud").unwrap_err();
        assert!(err.is_warning());
        assert_eq!(opts.warning_level, None);
    }

    #[test]
    fn bool_parse_is_case_insensitive() {
        let mut opts = OptionsNode::default();
        opts.set_raw("DebugInformation", "True").unwrap();
        assert_eq!(opts.debug_information, Some(true));
        opts.set_raw("DebugInformation", " FALSE ").unwrap();
        assert_eq!(opts.debug_information, Some(false));
    }

    // ── copy_to ──────────────────────────────────────────────────────────

    #[test]
    fn copy_to_transfers_only_set_fields() {
        let mut src = OptionsNode::default();
        src.warning_level = Some(2);

        let mut dst = OptionsNode::default();
        dst.optimize_code = Some(false);

        src.copy_to(&mut dst);

        assert_eq!(dst.warning_level, Some(2));
        // Unset on the source, so the target keeps its own value.
        assert_eq!(dst.optimize_code, Some(false));
        assert_eq!(dst.compiler_defines, None);
    }

    #[test]
    fn copy_to_overwrites_set_fields() {
        let mut src = OptionsNode::default();
        src.output_type = Some("Library".into());

        let mut dst = OptionsNode::default();
        dst.output_type = Some("Exe".into());

        src.copy_to(&mut dst);
        assert_eq!(dst.output_type.as_deref(), Some("Library"));
    }

    #[test]
    fn copy_to_is_idempotent() {
        let mut src = OptionsNode::default();
        src.warning_level = Some(1);
        src.key_file = Some("sign.snk".into());

        let mut dst = OptionsNode::default();
        src.copy_to(&mut dst);
        let once = dst.clone();
        src.copy_to(&mut dst);
        assert_eq!(dst, once);
    }

    // ── Lookup surface ───────────────────────────────────────────────────

    #[test]
    fn value_or_default_falls_back() {
        let mut opts = OptionsNode::default();
        assert_eq!(
            opts.value_or_default("WarningLevel"),
            Some(OptionValue::Int(4))
        );
        opts.set_raw("WarningLevel", "0").unwrap();
        assert_eq!(
            opts.value_or_default("WarningLevel"),
            Some(OptionValue::Int(0))
        );
        assert_eq!(opts.value_or_default("NoSuchOption"), None);
    }

    #[test]
    fn defined_lists_set_names_in_table_order() {
        let mut opts = OptionsNode::default();
        opts.set_raw("OutputPath", "out/").unwrap();
        opts.set_raw("CompilerDefines", "X").unwrap();
        assert_eq!(opts.defined(), vec!["CompilerDefines", "OutputPath"]);
    }

    #[test]
    fn is_set_tracks_explicit_assignment() {
        let mut opts = OptionsNode::default();
        assert!(!opts.is_set("OutDir"));
        opts.set_raw("OutDir", "bin/").unwrap();
        assert!(opts.is_set("OutDir"));
    }
}
