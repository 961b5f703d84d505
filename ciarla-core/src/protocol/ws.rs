/* This file defines how data "travel" through the web socket.
    Every frame is a JSON envelope { type, payload }:
    ClientEvent -> events sent by the browser (join, message, typing state)
    ServerEvent -> events the relay fans out to the *other* clients, plus the
                   connect handshake sent only to the new connection
    Disconnect has no frame of its own, it is the socket closing.
    Payloads are not validated: whatever JSON the client puts there (or nothing)
    is relayed as is, absent/null becomes null. Only broken JSON and unknown
    types are rejected.
*/
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{error::ProtocolError, models::ChatMessage};

/// Evento Client → Server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientEvent {
    /// Il client annuncia il proprio nome. `None` se il payload manca o è null.
    #[serde(rename = "new-user")]
    NewUser(Option<Value>),
    /// Testo di un messaggio (già trimmato dal client), qualunque tipo JSON.
    #[serde(rename = "send-chat-message")]
    SendChatMessage(Option<Value>),
    #[serde(rename = "typing")]
    Typing,
    #[serde(rename = "stop-typing")]
    StopTyping,
}

/// Forma grezza di un frame in ingresso: `type` obbligatorio, `payload` qualsiasi o assente.
#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<Value>,
}

impl<'de> Deserialize<'de> for ClientEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let RawFrame { kind, payload } = RawFrame::deserialize(deserializer)?;
        match kind.as_str() {
            "new-user" => Ok(ClientEvent::NewUser(payload)),
            "send-chat-message" => Ok(ClientEvent::SendChatMessage(payload)),
            // eventuali payload su typing/stop-typing sono ignorati
            "typing" => Ok(ClientEvent::Typing),
            "stop-typing" => Ok(ClientEvent::StopTyping),
            other => Err(de::Error::custom(format!("unknown event type `{other}`"))),
        }
    }
}

impl ClientEvent {
    /// Decodifica un frame testuale ricevuto dal socket.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Nome dell'evento sul wire, utile nei log.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::NewUser(_) => "new-user",
            ClientEvent::SendChatMessage(_) => "send-chat-message",
            ClientEvent::Typing => "typing",
            ClientEvent::StopTyping => "stop-typing",
        }
    }
}

/// Payload del primo frame inviato a ogni nuova connessione.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Id di sessione assegnato dal server.
    pub id: String,
}

/// Evento Server → Client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerEvent {
    /// Solo alla connessione appena registrata.
    #[serde(rename = "connect")]
    Connect(Handshake),
    /// Payload del new-user così com'era, null se assente.
    #[serde(rename = "user-connected")]
    UserConnected(Option<Value>),
    #[serde(rename = "chat-message")]
    ChatMessage(ChatMessage),
    /// `None` se il mittente non ha ancora un nome.
    #[serde(rename = "user-typing")]
    UserTyping(Option<Value>),
    #[serde(rename = "user-stop-typing")]
    UserStopTyping(Option<Value>),
    #[serde(rename = "user-disconnected")]
    UserDisconnected(Value),
}

impl ServerEvent {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    /// Nome dell'evento sul wire, utile nei log.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Connect(_) => "connect",
            ServerEvent::UserConnected(_) => "user-connected",
            ServerEvent::ChatMessage(_) => "chat-message",
            ServerEvent::UserTyping(_) => "user-typing",
            ServerEvent::UserStopTyping(_) => "user-stop-typing",
            ServerEvent::UserDisconnected(_) => "user-disconnected",
        }
    }
}
