use thiserror::Error;

/// Errore del protocollo WS (frame in ingresso o eventi in uscita).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON non valido, `type` mancante o sconosciuto. Il payload non viene mai validato.
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}
