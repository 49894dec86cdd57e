//! Shared mocks and a minimal executor for host tests.

extern crate std;

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::string::String as StdString;
use std::vec::Vec;

use crate::keys::Key;
use crate::output::{KeyboardError, KeyboardOutput};
use crate::record::{self, RECORD_CAP};
use crate::state::DeviceState;
use crate::indicator::StatusIndicator;
use crate::store::{SettingsStore, StoreError};

/// One recorded keyboard primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyEvent {
    Press(Key),
    ReleaseAll,
    Tap(Key),
    Char(char),
    Hold(u32),
}

/// Keyboard sink that records every primitive in order.
pub(crate) struct MockKeyboard {
    pub events: Vec<KeyEvent>,
}

impl MockKeyboard {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }
}

impl KeyboardOutput for MockKeyboard {
    fn press(&mut self, key: Key) -> impl Future<Output = Result<(), KeyboardError>> {
        self.events.push(KeyEvent::Press(key));
        core::future::ready(Ok(()))
    }

    fn release_all(&mut self) -> impl Future<Output = Result<(), KeyboardError>> {
        self.events.push(KeyEvent::ReleaseAll);
        core::future::ready(Ok(()))
    }

    fn tap(&mut self, key: Key) -> impl Future<Output = Result<(), KeyboardError>> {
        self.events.push(KeyEvent::Tap(key));
        core::future::ready(Ok(()))
    }

    fn type_char(&mut self, c: char) -> impl Future<Output = Result<(), KeyboardError>> {
        self.events.push(KeyEvent::Char(c));
        core::future::ready(Ok(()))
    }

    fn hold(&mut self, duration_ms: u32) -> impl Future<Output = Result<(), KeyboardError>> {
        self.events.push(KeyEvent::Hold(duration_ms));
        core::future::ready(Ok(()))
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// In-memory settings store over the real record codec.
pub(crate) struct MockStore {
    /// Raw record "on disk"; `None` means no record exists.
    pub raw: Option<Vec<u8>>,
    /// Force this error from `load`.
    pub load_error: Option<StoreError>,
    /// Make every `save` fail with `StoreError::Io`.
    pub fail_saves: bool,
    /// Every record successfully saved, as UTF-8 text, in order.
    pub records: Vec<StdString>,
}

impl MockStore {
    pub fn empty() -> Self {
        Self {
            raw: None,
            load_error: None,
            fail_saves: false,
            records: Vec::new(),
        }
    }

    pub fn with_raw(raw: &[u8]) -> Self {
        Self {
            raw: Some(Vec::from(raw)),
            ..Self::empty()
        }
    }

    pub fn with_state(state: DeviceState) -> Self {
        let mut buf = [0u8; RECORD_CAP];
        let len = record::encode(&state, &mut buf).unwrap();
        Self::with_raw(&buf[..len])
    }

    pub fn failing(err: StoreError) -> Self {
        Self {
            load_error: Some(err),
            fail_saves: true,
            ..Self::empty()
        }
    }
}

impl SettingsStore for MockStore {
    fn load(&mut self) -> impl Future<Output = Result<Option<DeviceState>, StoreError>> {
        let result = if let Some(err) = self.load_error {
            Err(err)
        } else {
            match &self.raw {
                None => Ok(None),
                Some(bytes) => record::decode(bytes)
                    .map(Some)
                    .map_err(|_| StoreError::Corrupt),
            }
        };
        core::future::ready(result)
    }

    fn save(&mut self, state: &DeviceState) -> impl Future<Output = Result<(), StoreError>> {
        let result = if self.fail_saves {
            Err(StoreError::Io)
        } else {
            let mut buf = [0u8; RECORD_CAP];
            match record::encode(state, &mut buf) {
                Ok(len) => {
                    self.raw = Some(Vec::from(&buf[..len]));
                    self.records
                        .push(StdString::from_utf8_lossy(&buf[..len]).into_owned());
                    Ok(())
                }
                Err(_) => Err(StoreError::Io),
            }
        };
        core::future::ready(result)
    }
}

/// Indicator that counts its calls.
pub(crate) struct CountingIndicator {
    pub activity: usize,
    pub idle: usize,
}

impl CountingIndicator {
    pub fn new() -> Self {
        Self {
            activity: 0,
            idle: 0,
        }
    }
}

impl StatusIndicator for CountingIndicator {
    fn activity(&mut self) {
        self.activity += 1;
    }

    fn idle(&mut self) {
        self.idle += 1;
    }
}

/// Run a future to completion (simple blocking executor).
///
/// The mocks only ever return ready futures, so a no-op waker suffices.
pub(crate) fn block_on<F: Future>(mut f: F) -> F::Output {
    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);

    // SAFETY: We don't move f after pinning
    let mut f = unsafe { Pin::new_unchecked(&mut f) };

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {
                panic!("Mock future returned Pending unexpectedly");
            }
        }
    }
}
