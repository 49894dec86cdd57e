//! Budget-G pedal firmware for the Raspberry Pi Pico W.
//!
//! A single footswitch that shows up as a USB HID keyboard. A press types
//! a saved text, sends a key combo, or taps a single key; which one is
//! configured over Wi-Fi. The device runs an access point whose captive
//! portal serves the configuration page, and the selection is persisted
//! in the last flash sector.
//!
//! # Hardware Configuration
//!
//! | Function   | GPIO       | Description                         |
//! |------------|------------|-------------------------------------|
//! | Footswitch | 16         | Momentary switch to GND (pull-up)   |
//! | CYW43 PWR  | 23         | Wi-Fi chip power (board wiring)     |
//! | CYW43 CS   | 25         | Wi-Fi chip SPI chip select          |
//! | CYW43 SPI  | 24, 29     | Wi-Fi chip PIO SPI (DIO, CLK)       |
//! | LED        | CYW43 GPIO 0 | On-board LED (activity indicator) |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime. The [`pedal_core::Pedal`]
//! controller owns the device state and sits behind one async mutex; the
//! HTTP task and the button task lock it per operation, which serializes
//! configuration writes against key emissions. Everything else is
//! plumbing tasks: the cyw43 runner, the network stack runner, the USB
//! device task, the wildcard DNS responder, and the LED blinker.
//!
//! # Modules
//!
//! - [`usb_keyboard`]: USB HID keyboard ([`UsbKeyboard`])
//! - [`flash_store`]: settings record in the last flash sector
//!   ([`FlashStore`])
//! - [`http`]: configuration server accept loop
//! - [`dns`]: captive-portal wildcard DNS responder
//! - [`button`]: debounced footswitch ([`Footswitch`])
//! - [`indicator`]: LED activity indicator ([`SignalIndicator`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints
//!   panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent reset)

#![no_std]

// Ensure mutually exclusive panic handlers
#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

// Re-export core types for convenience
pub use pedal_core::{
    DeviceState, Key, KeyboardError, KeyboardOutput, LoadOutcome, Mode, Pedal, RequestOutcome,
    SettingsStore, StatusIndicator, StoreError,
};

pub mod button;
pub mod dns;
pub mod flash_store;
pub mod http;
pub mod indicator;
pub mod usb_keyboard;

pub use button::Footswitch;
pub use flash_store::FlashStore;
pub use indicator::SignalIndicator;
pub use usb_keyboard::{configure_usb_keyboard, KeyboardReport, UsbKeyboard};

/// Access point name.
pub const WIFI_SSID: &str = "Budget-G_Pedal";

/// Access point passphrase.
pub const WIFI_PASSWORD: &str = "12345678";

/// Access point channel.
pub const WIFI_CHANNEL: u8 = 6;

/// The device's fixed address on its own network. Every DNS answer and
/// every portal redirect points here.
pub const AP_ADDRESS: [u8; 4] = [192, 168, 4, 1];

/// The concrete controller this firmware drives.
pub type PedalController = Pedal<FlashStore<'static>, UsbKeyboard<'static>, SignalIndicator>;

/// The controller behind its single writer lock. Locking per operation is
/// what keeps a configuration write from interleaving with a
/// partially-emitted key sequence.
pub type PedalMutex = Mutex<CriticalSectionRawMutex, PedalController>;
