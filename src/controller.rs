//! Pedal controller: connects state, store, catalog, and portal.

use crate::catalog;
use crate::indicator::StatusIndicator;
use crate::output::{KeyboardError, KeyboardOutput};
use crate::portal::{self, PortalRequest, Redirect, ResponseBuffer};
use crate::state::DeviceState;
use crate::store::{SettingsStore, StoreError};

/// How the persisted state was established at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadOutcome {
    /// A valid record was restored.
    Restored,
    /// No record existed; running on defaults.
    NoRecord,
    /// A record existed but did not parse; running on defaults. The next
    /// successful save repairs it.
    CorruptRecord,
    /// The storage medium failed to open; running on defaults, in memory
    /// only until a save succeeds.
    StorageUnavailable,
}

/// Result of handling one configuration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum RequestOutcome {
    /// The configuration page was rendered.
    Page,
    /// An update was committed and a 303 rendered. A failed save is
    /// reported here for logging but never changes the response; the
    /// protocol always appears to succeed to the client.
    Updated { persisted: Result<(), StoreError> },
    /// A captive-portal redirect was rendered.
    Redirected,
}

/// The device's one stateful component.
///
/// Owns the single [`DeviceState`] plus the three collaborator seams. A
/// `Pedal` is always ready: [`Pedal::start`] performs the load-or-fallback
/// before handing the value out, so the boot transition is encoded in
/// construction rather than a runtime flag.
///
/// Callers must serialize access (the firmware keeps the controller behind
/// a single mutex); the controller itself assumes one operation at a time,
/// which is what makes an emission an uninterruptible critical section
/// with respect to configuration writes.
pub struct Pedal<S, K, I> {
    state: DeviceState,
    store: S,
    keyboard: K,
    indicator: I,
}

impl<S, K, I> Pedal<S, K, I>
where
    S: SettingsStore,
    K: KeyboardOutput,
    I: StatusIndicator,
{
    /// Load the persisted state (falling back to defaults on any failure)
    /// and return the ready controller.
    pub async fn start(mut store: S, keyboard: K, indicator: I) -> (Self, LoadOutcome) {
        let (state, outcome) = match store.load().await {
            Ok(Some(state)) => (state, LoadOutcome::Restored),
            Ok(None) => (DeviceState::default(), LoadOutcome::NoRecord),
            Err(StoreError::Corrupt) => (DeviceState::default(), LoadOutcome::CorruptRecord),
            Err(StoreError::Unavailable) | Err(StoreError::Io) => {
                (DeviceState::default(), LoadOutcome::StorageUnavailable)
            }
        };
        (
            Self {
                state,
                store,
                keyboard,
                indicator,
            },
            outcome,
        )
    }

    /// Current device state.
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Handle a physical trigger press: emit the current mode's sequence.
    pub async fn on_trigger(&mut self) -> Result<(), KeyboardError> {
        self.indicator.activity();
        let result = catalog::emit(&self.state, &mut self.keyboard).await;
        self.indicator.idle();
        result
    }

    /// Handle one configuration request, rendering the complete response
    /// into `resp`.
    pub async fn handle_request(
        &mut self,
        head: &[u8],
        resp: &mut ResponseBuffer,
    ) -> RequestOutcome {
        resp.clear();
        match portal::route(head) {
            PortalRequest::Index => {
                if portal::write_page_response(&self.state, resp).is_err() {
                    // Response buffer overflow; should not happen with the
                    // payload cap, but a redirect always fits.
                    resp.clear();
                    let _ = portal::write_redirect(Redirect::Found, resp);
                    return RequestOutcome::Redirected;
                }
                RequestOutcome::Page
            }
            PortalRequest::Update(update) => {
                self.state.apply(&update);
                let persisted = self.store.save(&self.state).await;
                self.indicator.activity();
                self.indicator.idle();
                let _ = portal::write_redirect(Redirect::SeeOther, resp);
                RequestOutcome::Updated { persisted }
            }
            PortalRequest::Portal => {
                let _ = portal::write_redirect(Redirect::Found, resp);
                RequestOutcome::Redirected
            }
        }
    }
}
