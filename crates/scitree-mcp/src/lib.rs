//! # scitree-mcp
//!
//! MCP (Model Context Protocol) server for scitree.
//!
//! Exposes the loaded corpus and the tree engine as MCP tools:
//! - `scitree_retrieve`: Ranked hits for a query
//! - `scitree_get_documents`: Abstract and conclusions by document id
//! - `scitree_expand`: Expand a science goal into a full tree

pub mod tools;

pub use tools::ScitreeMcpService;
