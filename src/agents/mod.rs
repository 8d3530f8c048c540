//! Agents
//!
//! - **Document chat**: answers a question strictly from an extracted
//!   document's text

pub mod document_chat;

pub use document_chat::DocumentChatAgent;
