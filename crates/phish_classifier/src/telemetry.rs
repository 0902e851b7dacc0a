/// A malicious verdict, tagged with whether it was reached locally or
/// only after a `/matches` query. Emitted through the injected
/// `TelemetrySink`, never through `tracing`: this is a product signal
/// the host may route to an analytics pipe, distinct from operational
/// logs, which never carry the classified hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPageShown {
    pub host: String,
    pub client_side_hit: bool,
}

pub trait TelemetrySink: Send + Sync {
    fn error_page_shown(&self, event: ErrorPageShown);
}

/// Discards every event. Useful for hosts that don't want product
/// telemetry, and for tests that don't care about it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn error_page_shown(&self, _event: ErrorPageShown) {}
}
