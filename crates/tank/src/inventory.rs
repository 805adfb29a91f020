//! Multi-chamber fluid inventory with a shared capacity budget.
//!
//! Models the fluid plumbing of a multiblock machine: a fixed number of
//! typed tanks whose contents are bounded either per tank or by a single
//! budget across the whole bank. Hosts drive it through fill/drain/query
//! calls; rejected requests report through return values rather than
//! errors.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tankworks_core::{FluidId, FluidStack};

use crate::broadcast::BroadcastLevel;
use crate::layout::TankLayout;

/// How the capacity budget applies to the tanks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityMode {
    /// The budget bounds each tank independently.
    SeparateChambers,
    /// The budget bounds the sum across all tanks.
    SharedTank,
}

/// Snapshot of one tank, as reported to hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankInfo {
    /// Copy of the tank contents, `None` when empty.
    pub contents: Option<FluidStack>,
    /// The capacity budget in effect for the inventory.
    pub capacity: u32,
}

/// Fixed-arity bank of typed fluid tanks.
///
/// Constructed empty with capacity 0; the containing assembly sets the
/// real capacity once its geometry is known. Single-owner: mutated only
/// by the assembly that owns it, on a deterministic per-tick schedule.
/// Hosts that save from a worker thread should [`Clone`] first.
#[derive(Clone)]
pub struct FluidInventory {
    layout: Arc<dyn TankLayout>,
    pub(crate) names: Vec<String>,
    mode: CapacityMode,
    capacity: u32,
    pub(crate) slots: Vec<Option<FluidStack>>,
    pub(crate) last_broadcast: Vec<BroadcastLevel>,
    pub(crate) ticks_since_update: u32,
}

impl FluidInventory {
    /// Create an empty inventory over `layout`.
    ///
    /// Fails on misconfigured layouts: zero tanks, a name list whose
    /// length disagrees with the tank count, or duplicate names. These are
    /// programmer bugs in the host, caught once here instead of at every
    /// save (the names are cached for the inventory's lifetime).
    pub fn new(layout: Arc<dyn TankLayout>, mode: CapacityMode) -> Result<Self> {
        let count = layout.tank_count();
        if count == 0 {
            bail!("tank layout must declare at least one tank");
        }

        let names = layout.tank_names();
        if names.len() != count {
            bail!(
                "tank layout declared {count} tanks but returned {} names",
                names.len()
            );
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                bail!("tank layout returned duplicate tank name `{name}`");
            }
        }

        Ok(Self {
            layout,
            names,
            mode,
            capacity: 0,
            slots: vec![None; count],
            last_broadcast: vec![BroadcastLevel::Never; count],
            ticks_since_update: 0,
        })
    }

    /// Number of tanks. Fixed for the inventory's lifetime.
    pub fn tank_count(&self) -> usize {
        self.slots.len()
    }

    /// The capacity-sharing mode, fixed at construction.
    pub fn mode(&self) -> CapacityMode {
        self.mode
    }

    /// Current capacity budget.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Assign a new capacity budget. Shrinking below the current contents
    /// clamps them (see the clamp rules on [`CapacityMode`]).
    pub fn set_capacity(&mut self, capacity: u32) {
        let old = self.capacity;
        self.capacity = capacity;
        if capacity < old {
            self.clamp_contents_to_capacity();
        }
    }

    /// Total amount of fluid across all tanks.
    pub fn total_amount(&self) -> u32 {
        self.slots.iter().flatten().map(|stack| stack.amount()).sum()
    }

    /// Amount in one tank; 0 when empty or out of range.
    pub fn fluid_amount(&self, tank: usize) -> u32 {
        match self.slots.get(tank) {
            Some(Some(stack)) => stack.amount(),
            _ => 0,
        }
    }

    /// Fluid held by one tank; `None` when empty or out of range.
    pub fn fluid_type(&self, tank: usize) -> Option<&FluidId> {
        match self.slots.get(tank) {
            Some(Some(stack)) => Some(stack.fluid()),
            _ => None,
        }
    }

    /// Whether a fill of `fluid` into `tank` could make progress
    /// (ignoring headroom): the tank is empty and the layout permits the
    /// fluid, or already holds the same fluid.
    pub fn can_fill(&self, tank: usize, fluid: &FluidId) -> bool {
        self.can_accept(tank, fluid)
    }

    /// Whether `tank` currently holds `fluid`.
    pub fn can_drain(&self, tank: usize, fluid: &FluidId) -> bool {
        matches!(self.slots.get(tank), Some(Some(stack)) if stack.fluid() == fluid)
    }

    /// One-element description of `tank` for host tank-info queries.
    /// Out-of-range indices yield an empty vector.
    pub fn tank_info(&self, tank: usize) -> Vec<TankInfo> {
        match self.slots.get(tank) {
            Some(slot) => vec![TankInfo {
                contents: slot.clone(),
                capacity: self.capacity,
            }],
            None => Vec::new(),
        }
    }

    /// Offer `incoming` to `tank`, returning the amount accepted.
    ///
    /// Rejections (out-of-range tank, fluid the tank cannot take, no
    /// headroom) return 0. With `commit = false` the state is left
    /// untouched and the return value is exactly what a committed call
    /// would have accepted.
    pub fn fill(&mut self, tank: usize, incoming: &FluidStack, commit: bool) -> u32 {
        if !self.can_accept(tank, incoming.fluid()) {
            return 0;
        }

        let accepted = incoming.amount().min(self.headroom(tank));
        let Some(accepted) = NonZeroU32::new(accepted) else {
            return 0;
        };

        if commit {
            match &mut self.slots[tank] {
                Some(stack) => stack.grow(accepted.get()),
                slot => *slot = Some(incoming.with_amount(accepted)),
            }
        }
        accepted.get()
    }

    /// Drain up to `max_amount` from `tank`, whatever fluid it holds.
    ///
    /// Returns `None` when the tank is empty, out of range, or
    /// `max_amount` is 0. With `commit = true` the returned amount equals
    /// what was removed.
    ///
    /// With `commit = false` the returned amount is
    /// `max(contents, max_amount)` — it can exceed both the request and
    /// the tank contents. This reproduces long-standing behavior that
    /// existing callers depend on; use [`FluidInventory::peek_drain`] for
    /// an accurate simulation.
    pub fn drain(&mut self, tank: usize, max_amount: u32, commit: bool) -> Option<FluidStack> {
        if max_amount == 0 || tank >= self.slots.len() {
            return None;
        }
        let (fluid, held) = match &self.slots[tank] {
            Some(stack) => (stack.fluid().clone(), stack.amount()),
            None => return None,
        };

        let amount = if commit {
            self.drain_from_tank(tank, max_amount)
        } else {
            held.max(max_amount)
        };
        FluidStack::new(fluid, amount)
    }

    /// Drain from `tank` only if it holds the same fluid as `resource`,
    /// up to `resource`'s amount.
    ///
    /// Shares the `commit = false` quirk of [`FluidInventory::drain`].
    pub fn drain_matching(
        &mut self,
        tank: usize,
        resource: &FluidStack,
        commit: bool,
    ) -> Option<FluidStack> {
        if tank >= self.slots.len() {
            return None;
        }
        let held = match &self.slots[tank] {
            Some(stack) if stack.is_fluid_equal(resource) => stack.amount(),
            _ => return None,
        };

        let amount = if commit {
            self.drain_from_tank(tank, resource.amount())
        } else {
            resource.amount().max(held)
        };
        FluidStack::new(resource.fluid().clone(), amount)
    }

    /// Accurate drain simulation: what a committed
    /// [`FluidInventory::drain`] would actually remove
    /// (`min(contents, max_amount)`).
    pub fn peek_drain(&self, tank: usize, max_amount: u32) -> Option<FluidStack> {
        if max_amount == 0 {
            return None;
        }
        let stack = self.slots.get(tank)?.as_ref()?;
        FluidStack::new(stack.fluid().clone(), stack.amount().min(max_amount))
    }

    /// Absorb `other` slot-wise, summing capacities.
    ///
    /// Per tank: an empty side yields to the other; matching fluids add
    /// their amounts; mismatched fluids keep whichever stack is larger
    /// (ties keep `self`). Contents are **not** clamped — the caller
    /// clamps once the combined assembly has set its real capacity — and
    /// the layout predicate is not re-run.
    ///
    /// Fails if the two inventories disagree on tank count.
    pub fn merge(&mut self, other: &FluidInventory) -> Result<()> {
        if other.slots.len() != self.slots.len() {
            bail!(
                "cannot merge a {}-tank inventory into a {}-tank inventory",
                other.slots.len(),
                self.slots.len()
            );
        }

        self.capacity = self.capacity.saturating_add(other.capacity);
        for (mine, theirs) in self.slots.iter_mut().zip(&other.slots) {
            let Some(theirs) = theirs else { continue };
            match mine {
                None => *mine = Some(theirs.clone()),
                Some(stack) if stack.is_fluid_equal(theirs) => stack.grow(theirs.amount()),
                Some(stack) if stack.amount() < theirs.amount() => *mine = Some(theirs.clone()),
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn can_accept(&self, tank: usize, fluid: &FluidId) -> bool {
        match self.slots.get(tank) {
            Some(Some(stack)) => stack.fluid() == fluid,
            Some(None) => self.layout.is_fluid_valid(tank, fluid),
            None => false,
        }
    }

    /// Contained amount relevant to `tank` under the active mode: the
    /// tank's own amount for separate chambers, the grand total for a
    /// shared tank.
    fn contained_amount(&self, tank: usize) -> u32 {
        match self.mode {
            CapacityMode::SeparateChambers => self.fluid_amount(tank),
            CapacityMode::SharedTank => self.total_amount(),
        }
    }

    fn headroom(&self, tank: usize) -> u32 {
        self.capacity.saturating_sub(self.contained_amount(tank))
    }

    /// Remove up to `amount` from `tank`, returning what came out. A tank
    /// drained to zero becomes empty; a zero-amount stack never exists.
    fn drain_from_tank(&mut self, tank: usize, amount: u32) -> u32 {
        match &mut self.slots[tank] {
            None => 0,
            Some(stack) if stack.amount() > amount => {
                stack.shrink(amount);
                amount
            }
            slot => slot.take().map(|stack| stack.amount()).unwrap_or(0),
        }
    }

    /// Restore the capacity invariant after the budget shrinks.
    ///
    /// Separate chambers: each tank is cut to the budget. Shared tank:
    /// overflow is drained starting from the highest index and moving
    /// down — higher indices hold the less valuable fluids (waste last in
    /// a fuel/waste bank), so they are sacrificed first.
    fn clamp_contents_to_capacity(&mut self) {
        match self.mode {
            CapacityMode::SeparateChambers => {
                let capacity = self.capacity;
                for (tank, slot) in self.slots.iter_mut().enumerate() {
                    let Some(stack) = slot else { continue };
                    if stack.amount() <= capacity {
                        continue;
                    }
                    match NonZeroU32::new(capacity) {
                        Some(cap) => {
                            debug!(tank, from = stack.amount(), to = capacity, "clamped tank");
                            stack.set_amount(cap);
                        }
                        None => {
                            debug!(tank, dropped = stack.amount(), "clamp emptied tank");
                            *slot = None;
                        }
                    }
                }
            }
            CapacityMode::SharedTank => {
                let total = self.total_amount();
                if total <= self.capacity {
                    return;
                }
                let mut overflow = total - self.capacity;
                for tank in (0..self.slots.len()).rev() {
                    if overflow == 0 {
                        break;
                    }
                    let Some(stack) = self.slots[tank].as_mut() else {
                        continue;
                    };
                    let held = stack.amount();
                    if stack.shrink(overflow) {
                        overflow = 0;
                    } else {
                        debug!(tank, dropped = held, "clamp emptied tank");
                        self.slots[tank] = None;
                        overflow -= held;
                    }
                }
            }
        }
    }
}

impl fmt::Debug for FluidInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FluidInventory")
            .field("mode", &self.mode)
            .field("capacity", &self.capacity)
            .field("slots", &self.slots)
            .field("ticks_since_update", &self.ticks_since_update)
            .finish_non_exhaustive()
    }
}
