//! refscope - asset reference explorer
//!
//! Builds a radial graph of everything that references a chosen asset,
//! classifies each link as hard or soft and game or editor-only, and lays
//! the referencers out on an arc around their parent. The graph can be
//! browsed in a terminal UI or exported as JSON, CSV or Markdown.

pub mod asset;
pub mod config;
pub mod explorer;
pub mod export;
pub mod graph;
pub mod ui;
