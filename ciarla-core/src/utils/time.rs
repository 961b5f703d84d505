use time::{error::Format, macros::format_description, OffsetDateTime, UtcOffset};

/// Sorgente dell'ora "server". Il relay la riceve dall'esterno così i test possono fissarla.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Orologio di sistema con l'offset locale fissato all'avvio.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    /// Legge l'offset locale; se non è determinabile usa UTC.
    /// Va chiamata prima che il runtime crei altri thread, altrimenti `time` rifiuta la lettura.
    pub fn local() -> Self {
        Self::new(UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Orologio fermo su un istante.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Formatta l'ora come "hh:mm AM|PM" (es. 14:02 -> "02:02 PM").
pub fn format_clock_time(at: OffsetDateTime) -> Result<String, Format> {
    at.format(format_description!("[hour repr:12]:[minute] [period]"))
}
