//! Device state: the selected action mode and its text payload.

use heapless::String;

/// Maximum payload length in bytes.
///
/// A no-alloc build needs a bound on the text. 256 bytes is far beyond
/// anything a footswitch macro realistically types and still fits in a
/// flash sector with room to spare.
pub const PAYLOAD_CAP: usize = 256;

/// Text payload associated with the text-accepting modes.
pub type Payload = String<PAYLOAD_CAP>;

/// Payload shipped on a factory-fresh device.
pub const DEFAULT_PAYLOAD: &str = "Hello Budget-G";

const _: () = assert!(DEFAULT_PAYLOAD.len() <= PAYLOAD_CAP);

/// Action performed when the pedal is pressed.
///
/// The discriminants are the wire identifiers used by both the persisted
/// record and the configuration protocol's `mode` parameter, so they must
/// never be reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Type the payload as a sequence of keystrokes.
    TypeText = 0,
    /// Ctrl + C.
    CopyCombo = 1,
    /// Ctrl + V.
    PasteCombo = 2,
    /// GUI + L (lock the host).
    LockCombo = 3,
    /// A single Enter keystroke.
    Enter = 4,
    /// A single Tab keystroke.
    Tab = 5,
    /// A single Space keystroke.
    Space = 6,
    /// Press-hold-release the payload's first character.
    SingleKey = 7,
}

impl Mode {
    /// Number of modes.
    pub const COUNT: usize = 8;

    /// All modes in identifier order.
    pub const ALL: [Mode; Mode::COUNT] = [
        Mode::TypeText,
        Mode::CopyCombo,
        Mode::PasteCombo,
        Mode::LockCombo,
        Mode::Enter,
        Mode::Tab,
        Mode::Space,
        Mode::SingleKey,
    ];

    /// Wire identifier of this mode.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Look up a mode by wire identifier.
    ///
    /// Returns `None` for identifiers outside the catalog; callers must
    /// never commit such a value to [`DeviceState`].
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Mode> {
        match id {
            0 => Some(Mode::TypeText),
            1 => Some(Mode::CopyCombo),
            2 => Some(Mode::PasteCombo),
            3 => Some(Mode::LockCombo),
            4 => Some(Mode::Enter),
            5 => Some(Mode::Tab),
            6 => Some(Mode::Space),
            7 => Some(Mode::SingleKey),
            _ => None,
        }
    }
}

/// The single durable entity: active mode plus its payload.
///
/// Exactly one of these exists per device, owned by the controller. Both
/// the configuration page and the trigger dispatch read the same value;
/// there is no separate pending/committed copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceState {
    pub mode: Mode,
    pub payload: Payload,
}

impl DeviceState {
    /// Apply a partial update; absent fields are left unchanged.
    pub fn apply(&mut self, update: &StateUpdate) {
        if let Some(mode) = update.mode {
            self.mode = mode;
        }
        if let Some(payload) = &update.payload {
            self.payload = payload.clone();
        }
    }
}

impl Default for DeviceState {
    /// Factory state: type the default greeting.
    fn default() -> Self {
        Self {
            mode: Mode::TypeText,
            payload: Payload::try_from(DEFAULT_PAYLOAD).unwrap_or_default(),
        }
    }
}

/// A partial update to [`DeviceState`].
///
/// Each field is independently optional: a configuration request may change
/// only the mode, only the payload, or both. Fields rejected during request
/// validation simply stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub mode: Option<Mode>,
    pub payload: Option<Payload>,
}

impl StateUpdate {
    /// True if the update carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.payload.is_none()
    }
}
