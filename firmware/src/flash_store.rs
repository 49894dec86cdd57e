//! Settings record in the last flash sector.
//!
//! The record lives in the final 4 KiB sector of the Pico's 2 MiB flash,
//! far above the program image. Erased flash reads as `0xFF`, so record
//! length is recovered by trimming the `0xFF` tail; an empty sector means
//! no record. Saving erases the sector and rewrites the whole record. A
//! power cut in between leaves a record the next load reports as corrupt,
//! which the controller answers by falling back to defaults.

use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE, PAGE_SIZE};
use embassy_rp::peripherals::FLASH;
use pedal_core::record::{self, RECORD_CAP};
use pedal_core::{DeviceState, SettingsStore, StoreError};

/// Total flash size of the Pico W.
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Offset of the settings sector (the last sector).
const SETTINGS_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

/// Bytes read/written per save: the record rounded up to whole pages.
const RECORD_AREA: usize = (RECORD_CAP + PAGE_SIZE - 1) / PAGE_SIZE * PAGE_SIZE;

const _: () = assert!(RECORD_AREA <= ERASE_SIZE);

/// [`SettingsStore`] over the RP2040's on-board flash.
pub struct FlashStore<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
}

impl<'d> FlashStore<'d> {
    /// Create a store over the given flash peripheral.
    pub fn new(flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>) -> Self {
        Self { flash }
    }
}

impl SettingsStore for FlashStore<'_> {
    async fn load(&mut self) -> Result<Option<DeviceState>, StoreError> {
        let mut buf = [0u8; RECORD_AREA];
        self.flash
            .blocking_read(SETTINGS_OFFSET, &mut buf)
            .map_err(|_| StoreError::Unavailable)?;

        // Trim the erased (0xFF) tail; an all-0xFF sector has no record.
        let len = buf.iter().rposition(|&b| b != 0xFF).map_or(0, |p| p + 1);
        if len == 0 {
            return Ok(None);
        }

        record::decode(&buf[..len])
            .map(Some)
            .map_err(|_| StoreError::Corrupt)
    }

    async fn save(&mut self, state: &DeviceState) -> Result<(), StoreError> {
        let mut buf = [0xFFu8; RECORD_AREA];
        let len = record::encode(state, &mut buf).map_err(|_| StoreError::Io)?;

        // Round up to whole pages; the 0xFF padding is indistinguishable
        // from erased flash on the next load.
        let write_len = (len + PAGE_SIZE - 1) / PAGE_SIZE * PAGE_SIZE;

        self.flash
            .blocking_erase(SETTINGS_OFFSET, SETTINGS_OFFSET + ERASE_SIZE as u32)
            .map_err(|_| StoreError::Io)?;
        self.flash
            .blocking_write(SETTINGS_OFFSET, &buf[..write_len])
            .map_err(|_| StoreError::Io)?;
        Ok(())
    }
}
