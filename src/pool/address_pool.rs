//! Ordered candidate addresses with round-robin fail-over and
//! revision-guarded redirects.
//!
//! Index 0 is the preferred address. At most one entry carries a non-zero
//! redirect revision; it is installed at the head by [`AddressPool::add_redirect`]
//! and moves through the fail-over order like any other entry afterwards.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use tracing::debug;

use super::address_set::AddressSet;
use crate::error::PoolError;

/// A single candidate address.
///
/// A revision of `0` marks a statically configured address; anything else is
/// a server-issued redirect tagged with the revision it was issued at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    address: String,
    redirect_revision: u64,
}

impl AddressEntry {
    pub fn configured(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            redirect_revision: 0,
        }
    }

    pub fn redirect(address: impl Into<String>, revision: u64) -> Self {
        Self {
            address: address.into(),
            redirect_revision: revision,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn redirect_revision(&self) -> u64 {
        self.redirect_revision
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect_revision != 0
    }
}

/// Outcome of a redirect decision, logged once the lock is released.
enum RedirectOutcome {
    Adopted { replaced: Option<AddressEntry> },
    Stale { active: u64, demoted: bool },
}

#[derive(Debug)]
pub struct AddressPool {
    entries: Mutex<VecDeque<AddressEntry>>,
}

impl AddressPool {
    /// Builds a pool from configured addresses, preserving their order.
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = addresses.into_iter().map(AddressEntry::configured).collect();

        Self {
            entries: Mutex::new(entries),
        }
    }

    /// All addresses joined by `,` in fail-over order.
    pub fn describe(&self) -> String {
        let addresses: Vec<String> = {
            let entries = self.entries.lock();
            entries.iter().map(|e| e.address.clone()).collect()
        };

        addresses.join(",")
    }

    /// The preferred address, or an empty string for an empty pool.
    pub fn current(&self) -> String {
        self.entries
            .lock()
            .front()
            .map(|e| e.address.clone())
            .unwrap_or_default()
    }

    /// Moves the preferred address to the back of the fail-over order.
    ///
    /// # Panics
    ///
    /// Panics if the pool is empty. Use [`AddressPool::try_rotate`] to get an
    /// error instead.
    pub fn rotate(&self) {
        if let Err(e) = self.try_rotate() {
            panic!("AddressPool::rotate: {e}");
        }
    }

    pub fn try_rotate(&self) -> Result<(), PoolError> {
        let demoted = {
            let mut entries = self.entries.lock();
            demote_head(&mut entries)?
        };

        debug!(address = %demoted, "rotated address to back of pool");
        Ok(())
    }

    /// Demotes the head entry if it is a redirect; otherwise does nothing.
    ///
    /// # Panics
    ///
    /// Panics if the pool is empty. Use [`AddressPool::try_reset`] to get an
    /// error instead.
    pub fn reset(&self) {
        if let Err(e) = self.try_reset() {
            panic!("AddressPool::reset: {e}");
        }
    }

    pub fn try_reset(&self) -> Result<(), PoolError> {
        let demoted = {
            let mut entries = self.entries.lock();
            let head = entries.front().ok_or(PoolError::Empty)?;
            if !head.is_redirect() {
                return Ok(());
            }
            demote_head(&mut entries)?
        };

        debug!(address = %demoted, "relinquished redirect at head of pool");
        Ok(())
    }

    /// Installs `address` as the preferred redirect target.
    ///
    /// Returns `false` when `revision` is older than the active redirect. In
    /// that case the active redirect is left in place, but moved away from the
    /// head if it was being preferred. An equal or newer revision replaces the
    /// active redirect.
    pub fn add_redirect(&self, address: impl Into<String>, revision: u64) -> bool {
        let address = address.into();

        let outcome = {
            let mut entries = self.entries.lock();
            debug_assert!(
                entries.iter().filter(|e| e.is_redirect()).count() <= 1,
                "address pool holds more than one redirect"
            );

            match entries.iter().position(AddressEntry::is_redirect) {
                Some(index) if revision < entries[index].redirect_revision => {
                    let active = entries[index].redirect_revision;
                    let demoted = index == 0;
                    if demoted {
                        entries.rotate_left(1);
                    }
                    RedirectOutcome::Stale { active, demoted }
                }
                found => {
                    let replaced = found.and_then(|index| entries.remove(index));
                    entries.push_front(AddressEntry::redirect(address.clone(), revision));
                    RedirectOutcome::Adopted { replaced }
                }
            }
        };

        match outcome {
            RedirectOutcome::Adopted { replaced } => {
                debug!(
                    %address,
                    revision,
                    replaced = replaced.as_ref().map(AddressEntry::address),
                    "redirect installed at head of pool"
                );
                true
            }
            RedirectOutcome::Stale { active, demoted } => {
                debug!(
                    %address,
                    revision,
                    active_revision = active,
                    demoted,
                    "stale redirect ignored"
                );
                false
            }
        }
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Copy of every entry in fail-over order.
    pub fn entries(&self) -> Vec<AddressEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn active_redirect(&self) -> Option<AddressEntry> {
        self.entries.lock().iter().find(|e| e.is_redirect()).cloned()
    }
}

impl fmt::Display for AddressPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl AddressSet for AddressPool {
    fn current(&self) -> String {
        AddressPool::current(self)
    }

    fn describe(&self) -> String {
        AddressPool::describe(self)
    }

    fn rotate(&self) {
        AddressPool::rotate(self)
    }

    fn reset(&self) {
        AddressPool::reset(self)
    }

    fn add_redirect(&self, address: &str, revision: u64) -> bool {
        AddressPool::add_redirect(self, address, revision)
    }

    fn count(&self) -> usize {
        AddressPool::count(self)
    }
}

/// Moves the head entry to the tail, returning its address.
fn demote_head(entries: &mut VecDeque<AddressEntry>) -> Result<String, PoolError> {
    let head = entries.pop_front().ok_or(PoolError::Empty)?;
    let address = head.address.clone();
    entries.push_back(head);
    Ok(address)
}
