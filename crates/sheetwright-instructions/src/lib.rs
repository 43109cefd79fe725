//! Instruction kinds, tool schema registry, and the argument
//! assembler that turns raw tool-call payloads into typed,
//! positionally-aligned instruction arguments.
mod args;
mod assemble;
mod kinds;
mod registry;

pub use args::{CellWrite, ChartArgs, InstructionArgs};
pub use assemble::{assemble, decode_plan, transpose, Assembled, AssembleError};
pub use kinds::{Instruction, InstructionKind};
pub use registry::{tool_for_kind, tool_for_name, InstructionTool, GET_INSTRUCTIONS};
