//! Settings store trait and error types.

use core::future::Future;

use crate::state::DeviceState;

/// Error type for settings storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The storage medium could not be opened/mounted.
    Unavailable,
    /// A record exists but does not parse; the caller must fall back to
    /// the default state rather than commit a partial value.
    Corrupt,
    /// Read/write failure on an otherwise healthy medium.
    Io,
}

/// Async trait for the non-volatile settings store.
///
/// Implementations own the placement of the record (flash sector, file,
/// in-memory map on the host) and use the [`crate::record`] codec for its
/// contents. `save` overwrites any prior record wholesale; there are no
/// partial or append writes.
///
/// Durability is best-effort: a save interrupted by power loss may leave a
/// record that decodes as corrupt, which the next load reports so the
/// caller can fall back to defaults. There is no checksum or backup copy.
pub trait SettingsStore {
    /// Load the persisted state. `Ok(None)` means no record exists.
    fn load(&mut self) -> impl Future<Output = Result<Option<DeviceState>, StoreError>>;

    /// Persist the state, replacing any prior record.
    fn save(&mut self, state: &DeviceState) -> impl Future<Output = Result<(), StoreError>>;
}
