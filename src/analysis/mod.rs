// src/analysis/mod.rs
pub mod flow;
pub mod sankey;

// Re-export commonly used types
pub use flow::{derive_flows, format_amount, FlowGraph};
pub use sankey::{layout, SankeyOptions};
