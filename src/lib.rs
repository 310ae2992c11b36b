pub mod error;
pub mod files;
pub mod kernel;
pub mod matcher;
pub mod model;
pub mod options;
pub mod registry;

pub use error::ParseError;
pub use files::{BuildAction, CopyToOutput, FileNode, FilesNode, MatchNode, SubType};
pub use kernel::Kernel;
pub use model::{ConfigurationNode, FrameworkVersion, ProjectNode, ProjectType, SolutionNode};
pub use options::{OptionValue, OptionsNode};
pub use registry::{NodeKind, NodeRegistry};
