//! Tool system: descriptors, the `Tool` trait, argument binding and the
//! per-agent registry.

pub mod arguments;
pub mod builtin;
pub mod descriptor;
pub mod registry;
pub mod tool;
pub mod validation;

pub use arguments::ToolArguments;
pub use builtin::{DIRECT_ANSWER_MARKER, LLM_TOOL_NAME};
pub use descriptor::{ParamType, ParameterSpec, ToolDescriptor, ToolDescriptorBuilder, ToolKind, ToolParameter};
pub use registry::{ToolLookup, ToolRegistry};
pub use tool::{FunctionTool, Tool};
pub use validation::bind_arguments;
