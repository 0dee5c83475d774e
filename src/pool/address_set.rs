/// Trait for abstracting the ordered candidate set a client connects through
pub trait AddressSet: Send + Sync {
    /// Address to try next; empty string when there is nothing to try.
    fn current(&self) -> String;

    /// Comma-separated addresses in fail-over order, for logging.
    fn describe(&self) -> String;

    /// Fail-over step after an attempt against `current()` failed.
    fn rotate(&self);

    /// Give up the preferred redirect, if one is at the head.
    fn reset(&self);

    /// Adopt a redirect unless `revision` is older than the active one.
    fn add_redirect(&self, address: &str, revision: u64) -> bool;

    fn count(&self) -> usize;
}
