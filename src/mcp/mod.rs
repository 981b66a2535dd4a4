//! Model Context Protocol (MCP) server implementation
//!
//! Provides a JSON-RPC 2.0 server over a pair of byte streams, exposing the
//! family snapshot through tools, resources and prompt templates.

pub mod framing;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use framing::{encode_frame, FrameOutcome, FrameParser};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use resources::ResourceHandler;
pub use server::McpServer;
pub use tools::ToolHandler;
