//! Fault-tree driven test extraction.
//!
//! Fault-pattern XML holds one or more `<pattern>` elements, each a
//! `topEvent -> intermediateEvent -> basicEvent` hierarchy with an optional
//! `mappings` section. Extraction produces a node/edge graph and one test
//! case per triggering basic event:
//! - `invalid-range`: the basic event is an out-of-range value
//! - `invalid-mapping`: the basic event is bound to a stage through a mapping
//! - `safety-property`: the basic event violates its parent event
//!
//! Labels that cannot be understood degrade to generic inputs; extraction
//! only fails on malformed XML or a document with no fault tree in it.

mod condition;
mod event;
mod extract;
mod graph;
mod pattern;

pub use condition::{Comparison, Condition, NumericSpan};
pub use event::{BasicEvent, EventSource};
pub use extract::{parse_fault_tree, FaultExtraction};
pub use graph::FaultGraph;
pub use pattern::{FaultPattern, PatternKind};
