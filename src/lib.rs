//! Platform-agnostic core for the Budget-G USB footswitch.
//!
//! A single-button pedal emits one of several canned input actions (typed
//! text, a key combo, a single keystroke) over USB HID. Which action is
//! configured over Wi-Fi: the device runs an access point whose captive
//! portal serves a small configuration page, and the selection survives
//! power cycles in a two-line persisted record.
//!
//! This crate holds everything that does not touch hardware and can
//! therefore run (and be tested) on the host:
//!
//! - [`state`]: the one durable entity ([`DeviceState`]) and partial
//!   updates to it
//! - [`catalog`]: the static mode table and its emission procedures
//! - [`record`]: the persisted record codec
//! - [`portal`]: configuration-protocol routing and page rendering
//! - [`controller`]: the [`Pedal`] orchestrating all of the above
//! - [`keys`], [`output`], [`store`], [`indicator`]: the seams to the
//!   HID transport, non-volatile storage, and visible indicator
//!
//! The firmware crate implements the seams on real hardware and drives
//! the controller from its network, USB, and GPIO tasks.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod catalog;
pub mod controller;
pub mod indicator;
pub mod keys;
pub mod output;
pub mod portal;
pub mod record;
pub mod state;
pub mod store;

#[cfg(test)]
mod testutil;

// Re-export main types at crate root
pub use catalog::{emit, lookup, CatalogEntry, Emission, CATALOG, KEY_HOLD_MS};
pub use controller::{LoadOutcome, Pedal, RequestOutcome};
pub use indicator::{NullIndicator, StatusIndicator};
pub use keys::Key;
pub use output::{KeyboardError, KeyboardOutput};
pub use portal::{PortalRequest, Redirect, ResponseBuffer, PORTAL_URL, RESPONSE_CAP};
pub use record::{RecordError, RECORD_CAP};
pub use state::{DeviceState, Mode, Payload, StateUpdate, DEFAULT_PAYLOAD, PAYLOAD_CAP};
pub use store::{SettingsStore, StoreError};
