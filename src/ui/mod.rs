// src/ui/mod.rs
pub mod analyses;
pub mod charts;
pub mod editor;
pub mod sankey;
pub mod sign_in;
