//! Symbolic key identifiers emitted by the action catalog.

/// A key the catalog can emit.
///
/// This is the symbolic seam between the catalog and the HID transport:
/// the catalog speaks in keys, the transport translates them into usage
/// ids and modifier bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// A printable character, typed with whatever modifiers the host
    /// layout needs (the transport owns that mapping).
    Char(char),
    Enter,
    Tab,
    Space,
    LeftCtrl,
    /// The GUI/Super/Windows modifier.
    LeftGui,
}
