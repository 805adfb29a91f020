//! Multi-chamber fluid inventories for multiblock machines.
//!
//! A [`FluidInventory`] holds a fixed number of typed fluid tanks behind a
//! single capacity budget, applied either per tank or across the whole
//! bank. It covers the fluid plumbing a machine assembly needs: filling
//! and draining through host pipes, merging when two assemblies fuse,
//! persistence into a key-value tag tree, and a coalescing "worth telling
//! observers yet?" signal polled once per tick.
//!
//! The inventory is single-owner and deterministic: no operation blocks,
//! and rejected requests report through return values (`0` / `None`)
//! rather than errors.

pub mod broadcast;
pub mod inventory;
pub mod layout;
pub mod persist;

pub use broadcast::{BroadcastLevel, MIN_DEVIANCE_FOR_UPDATE, MIN_TICKS_BETWEEN_UPDATES};
pub use inventory::{CapacityMode, FluidInventory, TankInfo};
pub use layout::{StaticLayout, TankLayout};
pub use persist::{load_tank_file, save_tank_file};

pub use tankworks_core::{FluidId, FluidStack, TagCompound, TagValue};
