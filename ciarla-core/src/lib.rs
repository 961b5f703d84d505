//! ciarla-core: tipi condivisi tra client e server (eventi WS, modelli, errori).
//! Niente I/O: il crate server e i client lo usano solo per (de)serializzare.

pub mod models;
pub mod protocol;
pub mod error;
pub mod utils;

// Re-export utili per ridurre i percorsi nei crate client/server
pub use error::ProtocolError;
pub use models::ChatMessage;
pub use protocol::ws::{ClientEvent, Handshake, ServerEvent};
pub use utils::{format_clock_time, new_connection_id, Clock, FixedClock, SystemClock};
