//! Registro delle sessioni attive: id connessione -> Session.
//!
//! Vive dentro il coordinatore del relay, che lo muta un comando alla volta,
//! quindi è una semplice `HashMap` senza lock.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Un client connesso.
#[derive(Debug)]
pub struct Session {
    /// Id assegnato alla connessione, stabile per tutta la sessione.
    pub id: String,
    /// Payload dell'ultimo new-user, qualunque valore JSON; `None` finché non c'è.
    display_name: Option<Value>,
    /// Canale verso il task che scrive sul websocket di questo client.
    outbound: UnboundedSender<String>,
}

impl Session {
    fn new(id: String, outbound: UnboundedSender<String>) -> Self {
        Self { id, display_name: None, outbound }
    }

    pub fn display_name(&self) -> Option<&Value> {
        self.display_name.as_ref()
    }

    /// Accoda un frame già serializzato. `false` se il client ha chiuso.
    pub fn send(&self, frame: String) -> bool {
        self.outbound.send(frame).is_ok()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<String, Session>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crea la sessione (senza nome) per una connessione appena aperta.
    /// Un id già presente sostituisce la vecchia sessione, il cui canale viene chiuso.
    pub fn register(&mut self, id: String, outbound: UnboundedSender<String>) -> &Session {
        let session = Session::new(id.clone(), outbound);
        if let Some(previous) = self.sessions.insert(id.clone(), session) {
            debug!(
                connection_id = %previous.id,
                had_name = previous.display_name.is_some(),
                "session id reused, previous session replaced"
            );
        }
        &self.sessions[&id]
    }

    /// Salva il nome così com'è: nessuna validazione, nessun controllo di unicità.
    /// `None` (payload assente o null) riporta la sessione senza nome.
    /// Ritorna `false` se la connessione non è registrata.
    pub fn set_display_name(&mut self, id: &str, name: Option<Value>) -> bool {
        match self.sessions.get_mut(id) {
            Some(session) => {
                session.display_name = name;
                true
            }
            None => false,
        }
    }

    /// Rimuove la sessione. Chiamarla due volte non è un errore: la seconda ritorna `None`.
    pub fn unregister(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn display_name(&self, id: &str) -> Option<&Value> {
        self.get(id).and_then(Session::display_name)
    }

    /// Tutte le sessioni tranne quella indicata.
    pub fn others<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Session> + 'a {
        self.sessions.values().filter(move |s| s.id != id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessioni che hanno già fatto join.
    pub fn named_count(&self) -> usize {
        self.sessions.values().filter(|s| s.display_name.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn channel() -> (UnboundedSender<String>, UnboundedReceiver<String>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn register_starts_without_name() {
        let mut reg = Registry::new();
        let (tx, _rx) = channel();
        let session = reg.register("c1".into(), tx);
        assert_eq!(session.id, "c1");
        assert!(session.display_name().is_none());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.named_count(), 0);
    }

    #[test]
    fn set_display_name_is_verbatim_and_overwritable() {
        let mut reg = Registry::new();
        let (tx, _rx) = channel();
        reg.register("c1".into(), tx);

        assert!(reg.set_display_name("c1", Some(json!("  Alice "))));
        assert_eq!(reg.display_name("c1"), Some(&json!("  Alice ")));

        assert!(reg.set_display_name("c1", Some(json!("Alicia"))));
        assert_eq!(reg.display_name("c1"), Some(&json!("Alicia")));
    }

    #[test]
    fn non_string_and_missing_names_are_stored_as_given() {
        let mut reg = Registry::new();
        let (tx, _rx) = channel();
        reg.register("c1".into(), tx);

        assert!(reg.set_display_name("c1", Some(json!(42))));
        assert_eq!(reg.display_name("c1"), Some(&json!(42)));
        assert_eq!(reg.named_count(), 1);

        // new-user senza payload: la sessione torna senza nome
        assert!(reg.set_display_name("c1", None));
        assert!(reg.display_name("c1").is_none());
        assert_eq!(reg.named_count(), 0);
    }

    #[test]
    fn register_with_reused_id_replaces_previous_session() {
        let mut reg = Registry::new();
        let (tx_old, mut rx_old) = channel();
        let (tx_new, mut rx_new) = channel();
        reg.register("c1".into(), tx_old);
        reg.set_display_name("c1", Some(json!("Alice")));

        let session = reg.register("c1".into(), tx_new);
        assert!(session.display_name().is_none());
        assert!(session.send("fresh".into()));

        assert_eq!(reg.len(), 1);
        assert_eq!(rx_new.try_recv().unwrap(), "fresh");
        // il vecchio sender è stato droppato con la sessione sostituita
        assert!(matches!(
            rx_old.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn set_display_name_on_unknown_connection() {
        let mut reg = Registry::new();
        assert!(!reg.set_display_name("ghost", Some(json!("Bob"))));
        assert!(reg.is_empty());
    }

    #[test]
    fn duplicate_names_are_accepted() {
        let mut reg = Registry::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        reg.register("c1".into(), tx1);
        reg.register("c2".into(), tx2);
        assert!(reg.set_display_name("c1", Some(json!("Bob"))));
        assert!(reg.set_display_name("c2", Some(json!("Bob"))));
        assert_eq!(reg.named_count(), 2);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut reg = Registry::new();
        let (tx, _rx) = channel();
        reg.register("c1".into(), tx);
        reg.set_display_name("c1", Some(json!("Alice")));

        let removed = reg.unregister("c1").expect("session present");
        assert_eq!(removed.display_name(), Some(&json!("Alice")));
        assert!(reg.unregister("c1").is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn others_excludes_the_given_session() {
        let mut reg = Registry::new();
        for id in ["a", "b", "c"] {
            let (tx, _rx) = channel();
            reg.register(id.into(), tx);
        }
        let mut ids: Vec<&str> = reg.others("b").map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "c"]);

        // id sconosciuto: tutte le sessioni
        assert_eq!(reg.others("zzz").count(), 3);
    }

    #[test]
    fn session_send_fails_after_receiver_dropped() {
        let mut reg = Registry::new();
        let (tx, rx) = channel();
        reg.register("c1".into(), tx);
        let session = reg.get("c1").expect("registered");
        assert!(session.send("hello".into()));
        drop(rx);
        assert!(!session.send("again".into()));
    }
}
