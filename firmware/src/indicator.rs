//! LED activity indicator.
//!
//! The controller signals activity from wherever it happens (a save, an
//! emission); a dedicated task owns the cyw43-side LED and renders each
//! signal as one short blink. Rendering is deliberately outside the
//! controller's contract.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use pedal_core::StatusIndicator;

/// How long one activity blink lasts.
const BLINK_MS: u64 = 200;

/// Signal carrying "something happened" events to the LED task.
pub type IndicatorSignal = Signal<CriticalSectionRawMutex, ()>;

/// [`StatusIndicator`] that forwards events to the LED task.
///
/// Latest-value-wins: signalling during a blink extends nothing and
/// queues nothing, which is exactly right for an indicator.
pub struct SignalIndicator {
    signal: &'static IndicatorSignal,
}

impl SignalIndicator {
    pub fn new(signal: &'static IndicatorSignal) -> Self {
        Self { signal }
    }
}

impl StatusIndicator for SignalIndicator {
    fn activity(&mut self) {
        self.signal.signal(());
    }

    fn idle(&mut self) {
        // The LED task times each blink out by itself.
    }
}

/// Drive the on-board LED (cyw43 GPIO 0) from the indicator signal.
pub async fn run(mut control: cyw43::Control<'_>, signal: &'static IndicatorSignal) -> ! {
    loop {
        signal.wait().await;
        control.gpio_set(0, true).await;
        Timer::after_millis(BLINK_MS).await;
        control.gpio_set(0, false).await;
        signal.reset();
    }
}
