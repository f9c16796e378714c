//! Data types shared by the gizmo runner and CLI.
//!
//! # Main Types
//!
//! - [`AgentConfig`] - The user-supplied description of the custom agent to build
//! - [`SessionCookies`] - Persisted browser cookies reused across runs
//! - [`ToolSpecInfo`] - Best-effort summary of an OpenAPI document for logging

pub mod agent;
pub mod cookie;
pub mod tool;

pub use agent::{AgentConfig, MAX_CONVERSATION_STARTERS};
pub use cookie::{Cookie, SameSite, SessionCookies};
pub use tool::{ToolServer, ToolSpecInfo};
