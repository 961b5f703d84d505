use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messaggio di chat inoltrato agli altri client. Non viene mai salvato.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Payload così come inviato dal client (nessuna validazione lato server); `null` se mancava
    pub message: Option<Value>,

    /// Nome del mittente al momento dell'invio; `null` se non ha mai fatto join
    pub name: Option<Value>,

    pub timestamp: String, // "hh:mm AM|PM", ora locale del server
}
