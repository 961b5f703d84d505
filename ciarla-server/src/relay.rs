//! Event relay: traduce gli eventi di una connessione in broadcast verso tutte le *altre*.
//!
//! Un solo task (il coordinatore) possiede il [`Registry`] e applica i comandi
//! uno alla volta, fino in fondo, nell'ordine in cui arrivano. I task delle
//! connessioni parlano con lui solo tramite [`RelayHandle`].

use ciarla_core::{format_clock_time, ChatMessage, ClientEvent, Clock, Handshake, ServerEvent};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::Registry;

/// Comandi accettati dal coordinatore.
#[derive(Debug)]
pub(crate) enum RelayCommand {
    /// Nuova connessione websocket: `outbound` porta i frame verso il client.
    Connect {
        id: String,
        outbound: UnboundedSender<String>,
    },
    /// Evento decodificato ricevuto dalla connessione `id`.
    Event { id: String, event: ClientEvent },
    /// Il trasporto ha chiuso la connessione.
    Disconnect { id: String },
    Stats { reply: oneshot::Sender<RelayStats> },
}

/// Fotografia del registro, usata da `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStats {
    pub connections: usize,
    pub named: usize,
}

pub struct Relay {
    registry: Registry,
    clock: Box<dyn Clock>,
}

impl Relay {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            registry: Registry::new(),
            clock: Box::new(clock),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn apply(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Connect { id, outbound } => self.connect(id, outbound),
            RelayCommand::Event { id, event } => self.handle_event(&id, event),
            RelayCommand::Disconnect { id } => self.disconnect(&id),
            RelayCommand::Stats { reply } => {
                // il richiedente può aver già rinunciato
                let _ = reply.send(self.stats());
            }
        }
    }

    /// Registra la sessione e manda l'handshake solo a lei.
    pub fn connect(&mut self, id: String, outbound: UnboundedSender<String>) {
        let handshake = ServerEvent::Connect(Handshake { id: id.clone() }).encode();
        let session = self.registry.register(id.clone(), outbound);
        match handshake {
            Ok(frame) => {
                if !session.send(frame) {
                    warn!(connection_id = %id, "client gone before handshake");
                }
            }
            Err(e) => warn!(connection_id = %id, error = %e, "failed to encode handshake"),
        }
        debug!(connection_id = %id, sessions = self.registry.len(), "session registered");
    }

    /// Una mappatura per tipo di evento, sempre verso "tutti tranne il mittente".
    /// I payload passano così come sono, anche se mancano o non sono stringhe.
    pub fn handle_event(&mut self, id: &str, event: ClientEvent) {
        let outbound = match event {
            ClientEvent::NewUser(name) => {
                if !self.registry.set_display_name(id, name.clone()) {
                    debug!(connection_id = id, "join from unregistered connection");
                }
                info!(connection_id = id, name = ?name, "user joined");
                ServerEvent::UserConnected(name)
            }
            ClientEvent::SendChatMessage(message) => ServerEvent::ChatMessage(ChatMessage {
                message,
                name: self.sender_name(id),
                timestamp: self.timestamp(),
            }),
            ClientEvent::Typing => ServerEvent::UserTyping(self.sender_name(id)),
            ClientEvent::StopTyping => ServerEvent::UserStopTyping(self.sender_name(id)),
        };
        self.broadcast_except(id, &outbound);
    }

    /// Rimuove la sessione; avvisa gli altri solo se aveva un nome.
    pub fn disconnect(&mut self, id: &str) {
        let Some(session) = self.registry.unregister(id) else {
            debug!(connection_id = id, "disconnect for unknown session");
            return;
        };
        match session.display_name() {
            Some(name) => {
                info!(connection_id = id, name = %name, "user left");
                self.broadcast_except(id, &ServerEvent::UserDisconnected(name.clone()));
            }
            None => debug!(connection_id = id, "anonymous session closed"),
        }
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            connections: self.registry.len(),
            named: self.registry.named_count(),
        }
    }

    /// Serializza una volta e consegna a ogni altra sessione.
    /// Un peer con il canale chiuso non blocca gli altri. Ritorna quanti frame sono stati accodati.
    fn broadcast_except(&self, sender: &str, event: &ServerEvent) -> usize {
        let frame = match event.encode() {
            Ok(f) => f,
            Err(e) => {
                warn!(event_type = event.kind(), error = %e, "failed to encode event");
                return 0;
            }
        };
        let mut delivered = 0;
        for session in self.registry.others(sender) {
            if session.send(frame.clone()) {
                delivered += 1;
            } else {
                warn!(connection_id = %session.id, event_type = event.kind(), "failed to send event to client");
            }
        }
        debug!(event_type = event.kind(), sender, recipients = delivered, "broadcast");
        delivered
    }

    fn sender_name(&self, id: &str) -> Option<Value> {
        self.registry.display_name(id).cloned()
    }

    fn timestamp(&self) -> String {
        format_clock_time(self.clock.now()).unwrap_or_else(|e| {
            warn!(error = %e, "failed to format timestamp");
            String::new()
        })
    }

    /// Loop del coordinatore: termina quando tutti gli handle sono stati droppati.
    pub(crate) async fn run(mut self, mut rx: UnboundedReceiver<RelayCommand>) {
        while let Some(cmd) = rx.recv().await {
            self.apply(cmd);
        }
        debug!(sessions = self.registry.len(), "relay stopped");
    }
}

/// Lato mittente del coordinatore, clonabile in ogni connessione.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: UnboundedSender<RelayCommand>,
}

impl RelayHandle {
    /// Avvia il coordinatore su un task tokio.
    pub fn spawn(clock: impl Clock + 'static) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Relay::new(clock).run(rx));
        (Self { tx }, task)
    }

    pub fn connect(&self, id: String, outbound: UnboundedSender<String>) {
        self.submit(RelayCommand::Connect { id, outbound });
    }

    pub fn dispatch(&self, id: &str, event: ClientEvent) {
        self.submit(RelayCommand::Event { id: id.to_owned(), event });
    }

    pub fn disconnect(&self, id: &str) {
        self.submit(RelayCommand::Disconnect { id: id.to_owned() });
    }

    /// `None` se il coordinatore non gira più.
    pub async fn stats(&self) -> Option<RelayStats> {
        let (reply, rx) = oneshot::channel();
        self.submit(RelayCommand::Stats { reply });
        rx.await.ok()
    }

    fn submit(&self, cmd: RelayCommand) {
        if self.tx.send(cmd).is_err() {
            warn!("relay stopped, command dropped");
        }
    }
}
