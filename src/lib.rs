//! bookshelf-mcp — personal bookshelf served over MCP.
//!
//! Layers: `domain` (books and the shelf), `application` (persistence,
//! render/saved triggers, confirmation flow), `infra` (storage backends),
//! `interface` (MCP tools).

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod interface;
