//! USB HID keyboard output.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::Timer;
use embassy_usb::class::hid::{HidWriter, State};
use embassy_usb::Builder;
use pedal_core::{Key, KeyboardError, KeyboardOutput};

/// Left Control modifier bit in the report's modifier byte.
const MOD_LEFT_CTRL: u8 = 0x01;
/// Left Shift modifier bit.
const MOD_LEFT_SHIFT: u8 = 0x02;
/// Left GUI (Super/Windows) modifier bit.
const MOD_LEFT_GUI: u8 = 0x08;

/// Standard HID Keyboard Report Descriptor.
///
/// Eight modifier bits, one reserved byte, six simultaneous key slots:
/// the classic boot-keyboard layout every host understands.
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Modifier byte ---
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Reserved byte ---
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    //
    // --- Key array (6 slots) ---
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x2A, 0xFF, 0x00, //   Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array)
    //
    0xC0, // End Collection
];

/// USB HID keyboard report structure.
///
/// Total size: 8 bytes (modifiers: 1, reserved: 1, keys: 6).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, defmt::Format)]
pub struct KeyboardReport {
    /// Modifier bitfield (Ctrl/Shift/Alt/GUI, left and right).
    pub modifiers: u8,
    /// Usage ids of currently held keys, 0 = empty slot.
    pub keys: [u8; 6],
}

impl KeyboardReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = 8;

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        [
            self.modifiers,
            0, // reserved
            self.keys[0],
            self.keys[1],
            self.keys[2],
            self.keys[3],
            self.keys[4],
            self.keys[5],
        ]
    }

    /// Report with nothing held.
    #[must_use]
    pub const fn released() -> Self {
        Self {
            modifiers: 0,
            keys: [0; 6],
        }
    }

    /// Add modifiers and (if non-zero) a key usage to the report.
    ///
    /// A usage already present is not duplicated; with all six slots full
    /// the key is dropped, which cannot happen for this device's short
    /// emission sequences.
    fn add(&mut self, modifiers: u8, usage: u8) {
        self.modifiers |= modifiers;
        if usage == 0 || self.keys.contains(&usage) {
            return;
        }
        if let Some(slot) = self.keys.iter_mut().find(|slot| **slot == 0) {
            *slot = usage;
        }
    }
}

/// USB HID keyboard output.
///
/// Wraps an embassy-usb HID writer and tracks the report currently on the
/// wire. Keys stay held only within one emission sequence; `release_all`
/// always returns the report to neutral.
pub struct UsbKeyboard<'d> {
    writer: HidWriter<'d, Driver<'d, USB>, { KeyboardReport::SIZE }>,
    report: KeyboardReport,
    ready: bool,
}

impl<'d> UsbKeyboard<'d> {
    /// Create a new USB keyboard from the given HID writer.
    pub fn new(writer: HidWriter<'d, Driver<'d, USB>, { KeyboardReport::SIZE }>) -> Self {
        Self {
            writer,
            report: KeyboardReport::released(),
            ready: false,
        }
    }

    /// Wait until the device is ready (USB enumerated).
    pub async fn wait_ready(&mut self) {
        self.writer.ready().await;
        self.ready = true;
    }

    async fn write_report(&mut self) -> Result<(), KeyboardError> {
        self.writer
            .write(&self.report.as_bytes())
            .await
            .map_err(|_| KeyboardError::Io)
    }
}

impl KeyboardOutput for UsbKeyboard<'_> {
    async fn press(&mut self, key: Key) -> Result<(), KeyboardError> {
        let Some((modifiers, usage)) = key_usage(key) else {
            // Key has no usage id on a US layout; skip it.
            defmt::warn!("no HID usage for key, skipping");
            return Ok(());
        };
        self.report.add(modifiers, usage);
        self.write_report().await
    }

    async fn release_all(&mut self) -> Result<(), KeyboardError> {
        self.report = KeyboardReport::released();
        self.write_report().await
    }

    async fn tap(&mut self, key: Key) -> Result<(), KeyboardError> {
        self.press(key).await?;
        self.release_all().await
    }

    async fn type_char(&mut self, c: char) -> Result<(), KeyboardError> {
        self.tap(Key::Char(c)).await
    }

    async fn hold(&mut self, duration_ms: u32) -> Result<(), KeyboardError> {
        Timer::after_millis(u64::from(duration_ms)).await;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Translate a symbolic key into (modifier bits, usage id).
///
/// Returns `None` for characters with no usage id on a US layout; the
/// caller skips those rather than sending a wrong keystroke.
fn key_usage(key: Key) -> Option<(u8, u8)> {
    match key {
        Key::Enter => Some((0, 0x28)),
        Key::Tab => Some((0, 0x2B)),
        Key::Space => Some((0, 0x2C)),
        Key::LeftCtrl => Some((MOD_LEFT_CTRL, 0)),
        Key::LeftGui => Some((MOD_LEFT_GUI, 0)),
        Key::Char(c) => char_usage(c),
    }
}

/// US-layout character translation.
fn char_usage(c: char) -> Option<(u8, u8)> {
    let (shift, usage) = match c {
        'a'..='z' => (false, 0x04 + (c as u8 - b'a')),
        'A'..='Z' => (true, 0x04 + (c as u8 - b'A')),
        '1'..='9' => (false, 0x1E + (c as u8 - b'1')),
        '0' => (false, 0x27),
        '\n' => (false, 0x28), // Enter
        '\t' => (false, 0x2B), // Tab
        ' ' => (false, 0x2C),
        '!' => (true, 0x1E),
        '@' => (true, 0x1F),
        '#' => (true, 0x20),
        '$' => (true, 0x21),
        '%' => (true, 0x22),
        '^' => (true, 0x23),
        '&' => (true, 0x24),
        '*' => (true, 0x25),
        '(' => (true, 0x26),
        ')' => (true, 0x27),
        '-' => (false, 0x2D),
        '_' => (true, 0x2D),
        '=' => (false, 0x2E),
        '+' => (true, 0x2E),
        '[' => (false, 0x2F),
        '{' => (true, 0x2F),
        ']' => (false, 0x30),
        '}' => (true, 0x30),
        '\\' => (false, 0x31),
        '|' => (true, 0x31),
        ';' => (false, 0x33),
        ':' => (true, 0x33),
        '\'' => (false, 0x34),
        '"' => (true, 0x34),
        '`' => (false, 0x35),
        '~' => (true, 0x35),
        ',' => (false, 0x36),
        '<' => (true, 0x36),
        '.' => (false, 0x37),
        '>' => (true, 0x37),
        '/' => (false, 0x38),
        '?' => (true, 0x38),
        _ => return None,
    };
    Some((if shift { MOD_LEFT_SHIFT } else { 0 }, usage))
}

/// Configure the USB HID keyboard class in the USB builder.
///
/// Returns the HID writer for use by the application.
pub fn configure_usb_keyboard<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
) -> HidWriter<'d, Driver<'d, USB>, { KeyboardReport::SIZE }> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: 10,
        max_packet_size: 8,
        hid_subclass: embassy_usb::class::hid::HidSubclass::Boot,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::Keyboard,
    };

    HidWriter::new(builder, state, config)
}
