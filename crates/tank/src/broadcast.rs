//! Update-coalescing heuristic for reporting fluid levels to observers.
//!
//! Hosts poll [`FluidInventory::should_send_update`] once per logical
//! tick. It answers `true` only when a minimum number of ticks has passed
//! since the last broadcast *and* the levels have drifted enough to be
//! worth the traffic, so small per-tick changes coalesce into occasional
//! updates.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inventory::FluidInventory;

/// Number of ticks that must elapse between broadcasts. The gate is
/// exclusive: the counter must strictly exceed this value before the
/// level scan even runs.
pub const MIN_TICKS_BETWEEN_UPDATES: u32 = 60;

/// Minimum accumulated level drift, in fluid units across all tanks,
/// before a broadcast is warranted.
pub const MIN_DEVIANCE_FOR_UPDATE: u32 = 50;

/// The last level reported to observers for one tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastLevel {
    /// No broadcast has ever been made for this tank; the first scan that
    /// sees it filled always fires.
    Never,
    /// Level at the last broadcast (0 = reported empty).
    At(u32),
}

impl FluidInventory {
    /// Advance the tick counter and decide whether observers should be
    /// told about the current levels.
    ///
    /// Once the tick gate passes, tanks are scanned in order and the scan
    /// stops at the end of the first iteration that decides to update:
    /// a tank that emptied since the last broadcast, a tank filled for
    /// the first time, or accumulated drift reaching
    /// [`MIN_DEVIANCE_FOR_UPDATE`]. Returning `true` also rewrites the
    /// per-tank snapshot to the current levels and, in every gated call,
    /// resets the tick counter.
    pub fn should_send_update(&mut self) -> bool {
        self.ticks_since_update += 1;
        if self.ticks_since_update <= MIN_TICKS_BETWEEN_UPDATES {
            return false;
        }

        let mut deviance = 0u32;
        let mut should_update = false;
        for (slot, last) in self.slots.iter().zip(&self.last_broadcast) {
            if should_update {
                break;
            }
            match (slot, last) {
                (None, BroadcastLevel::At(prev)) if *prev > 0 => should_update = true,
                (Some(_), BroadcastLevel::Never) => should_update = true,
                (Some(stack), BroadcastLevel::At(prev)) => {
                    deviance += stack.amount().abs_diff(*prev);
                }
                // Empty now, never (or empty) before: nothing to report.
                _ => {}
            }
            if deviance >= MIN_DEVIANCE_FOR_UPDATE {
                should_update = true;
            }
        }

        if should_update {
            debug!(total = self.total_amount(), "fluid levels worth broadcasting");
            self.reset_last_seen_levels();
        }
        self.ticks_since_update = 0;
        should_update
    }

    /// Snapshot the current levels as "what observers last saw".
    pub(crate) fn reset_last_seen_levels(&mut self) {
        for (slot, last) in self.slots.iter().zip(self.last_broadcast.iter_mut()) {
            *last = BroadcastLevel::At(slot.as_ref().map_or(0, |stack| stack.amount()));
        }
    }
}
