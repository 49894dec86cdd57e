//! Action catalog: the static mode table and its emission procedures.
//!
//! Every mode-dependent behaviour in the device (what the configuration
//! page calls a mode, whether it takes free text, what the status line
//! says, which key sequence a trigger produces) comes from the one table
//! in this module. Adding a mode is a new [`Mode`] variant plus a catalog
//! row, nothing else.

use core::fmt::{self, Write};

use crate::keys::Key;
use crate::output::{KeyboardError, KeyboardOutput};
use crate::state::{DeviceState, Mode};

/// How long combo and single-key presses are held before release.
///
/// Hosts (games especially) debounce their input; a press that is released
/// in the same poll interval can be missed entirely.
pub const KEY_HOLD_MS: u32 = 50;

/// Emission procedure attached to a catalog row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Emission {
    /// Type the whole payload, character by character. No-op when empty.
    Text,
    /// Modifier-down, key-down, hold, release-all.
    Chord { modifier: Key, key: Key },
    /// A single key event.
    Tap(Key),
    /// Press-hold-release the payload's first character only. No-op when
    /// empty.
    FirstChar,
}

/// One row of the mode table.
pub struct CatalogEntry {
    pub mode: Mode,
    /// Option text on the configuration page.
    pub label: &'static str,
    /// Short action text for the status line (unused by the two
    /// payload-driven modes, which format their own status).
    pub action: &'static str,
    /// Whether the configuration page shows the text field for this mode.
    pub accepts_text: bool,
    pub emission: Emission,
}

/// The mode table. Indexed by mode identifier; fixed at build time.
pub static CATALOG: [CatalogEntry; Mode::COUNT] = [
    CatalogEntry {
        mode: Mode::TypeText,
        label: "Text Input (String)",
        action: "",
        accepts_text: true,
        emission: Emission::Text,
    },
    CatalogEntry {
        mode: Mode::CopyCombo,
        label: "Ctrl + C (Copy)",
        action: "Ctrl + C",
        accepts_text: false,
        emission: Emission::Chord {
            modifier: Key::LeftCtrl,
            key: Key::Char('c'),
        },
    },
    CatalogEntry {
        mode: Mode::PasteCombo,
        label: "Ctrl + V (Paste)",
        action: "Ctrl + V",
        accepts_text: false,
        emission: Emission::Chord {
            modifier: Key::LeftCtrl,
            key: Key::Char('v'),
        },
    },
    CatalogEntry {
        mode: Mode::LockCombo,
        label: "Win + L (Lock PC)",
        action: "Win + L",
        accepts_text: false,
        emission: Emission::Chord {
            modifier: Key::LeftGui,
            key: Key::Char('l'),
        },
    },
    CatalogEntry {
        mode: Mode::Enter,
        label: "Enter Key",
        action: "Enter",
        accepts_text: false,
        emission: Emission::Tap(Key::Enter),
    },
    CatalogEntry {
        mode: Mode::Tab,
        label: "Tab Key",
        action: "Tab",
        accepts_text: false,
        emission: Emission::Tap(Key::Tab),
    },
    CatalogEntry {
        mode: Mode::Space,
        label: "Space Key",
        action: "Space",
        accepts_text: false,
        emission: Emission::Tap(Key::Space),
    },
    CatalogEntry {
        mode: Mode::SingleKey,
        label: "Single Key (Press)",
        action: "",
        accepts_text: true,
        emission: Emission::FirstChar,
    },
];

/// Look up the catalog row for a mode. Total over all [`Mode`] values.
#[inline]
#[must_use]
pub fn lookup(mode: Mode) -> &'static CatalogEntry {
    &CATALOG[mode.id() as usize]
}

/// Write the human-readable status line for the current state.
///
/// `Type: "<payload>"` for the text mode, `Key Press: '<c>'` for the
/// single-key mode, `Action: <name>` for everything else. The line is
/// always fully resolved; there is no placeholder left to substitute.
pub fn write_status(state: &DeviceState, out: &mut impl Write) -> fmt::Result {
    let entry = lookup(state.mode);
    match entry.emission {
        Emission::Text => write!(out, "Type: \"{}\"", state.payload),
        Emission::FirstChar => {
            out.write_str("Key Press: '")?;
            if let Some(c) = state.payload.chars().next() {
                out.write_char(c)?;
            }
            out.write_str("'")
        }
        _ => write!(out, "Action: {}", entry.action),
    }
}

/// Perform the emission for the current state.
///
/// Deterministic per mode: the same state always produces the same ordered
/// event sequence on the keyboard sink.
pub async fn emit<K: KeyboardOutput>(
    state: &DeviceState,
    keyboard: &mut K,
) -> Result<(), KeyboardError> {
    match lookup(state.mode).emission {
        Emission::Text => {
            for c in state.payload.chars() {
                keyboard.type_char(c).await?;
            }
            Ok(())
        }
        Emission::Chord { modifier, key } => {
            keyboard.press(modifier).await?;
            keyboard.press(key).await?;
            keyboard.hold(KEY_HOLD_MS).await?;
            keyboard.release_all().await
        }
        Emission::Tap(key) => keyboard.tap(key).await,
        Emission::FirstChar => match state.payload.chars().next() {
            Some(c) => {
                keyboard.press(Key::Char(c)).await?;
                keyboard.hold(KEY_HOLD_MS).await?;
                keyboard.release_all().await
            }
            None => Ok(()),
        },
    }
}
