//! UI module for the refscope TUI
//!
//! This module provides the terminal user interface for browsing the
//! referencers of an asset and re-rooting the graph interactively.

mod app;
pub mod tree;

pub use app::{run_app, App};
pub use tree::TreeNode;
