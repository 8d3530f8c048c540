// LLM abstraction layer

pub mod openai;
pub mod provider;

pub use crate::types::*;
pub use provider::*;
