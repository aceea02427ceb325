//! Output sync handshake and input flyback wait.
//!
//! Both are bounded busy-polls of the output SYNC register. The hardware
//! raises no event for either condition.

use arcdvi_hal::RegisterBus;

use crate::regs;

/// Handshake polls before giving up. No delay between polls.
pub const SYNC_POLL_LIMIT: u32 = 1_000_000;

/// Polls allowed for each half (rising, then falling) of the flyback wait.
/// Only runs out when there is no input video at all.
pub const FLYBACK_POLL_LIMIT: u32 = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// The ack bit never matched the request. Carries the last SYNC value.
    Timeout { reg: u32 },
}

/// No flyback edge seen within [`FLYBACK_POLL_LIMIT`] polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlybackTimeout;

fn sync_addr() -> u32 {
    regs::vo(regs::VIDO_REG_SYNC)
}

fn ack_matches(reg: u32) -> bool {
    (reg & regs::VIDO_SYNC_REQ != 0) == (reg & regs::VIDO_SYNC_ACK != 0)
}

/// Ask the output logic to adopt the newly written timing.
///
/// Toggles the request bit once, then polls until the ack bit mirrors it.
/// Returns the final SYNC value. Never retries.
pub fn sync<B: RegisterBus>(bus: &mut B) -> Result<u32, SyncError> {
    let mut reg = bus.read32(sync_addr());
    log::debug!("Sync reg: {:02x}, requesting sync", reg);
    bus.write32(sync_addr(), reg ^ regs::VIDO_SYNC_REQ);

    for _ in 0..SYNC_POLL_LIMIT {
        reg = bus.read32(sync_addr());
        if ack_matches(reg) {
            log::info!("Synchronised (new reg {:02x})", reg);
            return Ok(reg);
        }
    }
    log::warn!("Sync timeout (reg {:02x})", reg);
    Err(SyncError::Timeout { reg })
}

/// Wait for a full 1-to-0 transition of the input flyback bit.
///
/// Depending on where in the frame this starts, it can take up to two frames.
pub fn wait_flyback<B: RegisterBus>(bus: &mut B) -> Result<(), FlybackTimeout> {
    wait_flyback_level(bus, true)?;
    wait_flyback_level(bus, false)
}

fn wait_flyback_level<B: RegisterBus>(bus: &mut B, level: bool) -> Result<(), FlybackTimeout> {
    for _ in 0..FLYBACK_POLL_LIMIT {
        if (bus.read32(sync_addr()) & regs::VIDO_SYNC_FLYBACK != 0) == level {
            return Ok(());
        }
    }
    Err(FlybackTimeout)
}
