//! Visible indicator seam.

/// Fire-and-forget hooks for the device's visible indicator.
///
/// The device flashes something visible on configuration writes and
/// during emissions; this trait reduces that to two calls and leaves the
/// rendering (LED, display, nothing at all) to the platform.
pub trait StatusIndicator {
    /// Signal that an event (write or emission) is happening.
    fn activity(&mut self);

    /// Signal that the device is idle again.
    fn idle(&mut self);
}

/// Indicator that does nothing.
pub struct NullIndicator;

impl StatusIndicator for NullIndicator {
    fn activity(&mut self) {}
    fn idle(&mut self) {}
}
