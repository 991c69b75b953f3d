//! CCTM Core Types
//!
//! This crate provides the foundational types used throughout the CCTM system:
//! - Value types (the Value enum for sampled inputs and literal class values)
//! - Numeric intervals with open bounds
//! - The classification tree model (UseCase, Variable, TerminalClass, Output)
//! - Partitions and test cases handed to export layers
//! - Fault-tree nodes, edges and fault test cases
//! - Representative-value sampling shared by partitions and fault extraction

mod fault;
mod interval;
mod partition;
mod sample;
mod testcase;
mod tree;
mod value;

pub use fault::*;
pub use interval::*;
pub use partition::*;
pub use sample::*;
pub use testcase::*;
pub use tree::*;
pub use value::*;
