//! Debounced footswitch input.

use embassy_rp::gpio::Input;
use embassy_time::Timer;

/// Debounce settle time after an edge.
const DEBOUNCE_MS: u64 = 20;

/// The pedal's momentary footswitch (active-low, pull-up).
///
/// Edge-triggered: one physical press yields exactly one
/// [`wait_for_press`](Self::wait_for_press) completion, however long the
/// switch is held.
pub struct Footswitch<'d> {
    pin: Input<'d>,
}

impl<'d> Footswitch<'d> {
    /// Wrap a pull-up input pin wired to the switch.
    pub fn new(pin: Input<'d>) -> Self {
        Self { pin }
    }

    /// Wait for a debounced press edge.
    pub async fn wait_for_press(&mut self) {
        loop {
            self.pin.wait_for_falling_edge().await;
            Timer::after_millis(DEBOUNCE_MS).await;
            if self.pin.is_low() {
                return;
            }
            // Bounce shorter than the settle time; keep waiting.
        }
    }

    /// Wait for a debounced release.
    pub async fn wait_for_release(&mut self) {
        loop {
            self.pin.wait_for_high().await;
            Timer::after_millis(DEBOUNCE_MS).await;
            if self.pin.is_high() {
                return;
            }
        }
    }
}
