pub mod ws;

// Re-export comodi
pub use ws::{ClientEvent, Handshake, ServerEvent};
