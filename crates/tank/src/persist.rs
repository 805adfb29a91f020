//! Tag-tree persistence and the on-disk tank file format.
//!
//! Inventories persist into a [`TagCompound`] keyed by the layout's tank
//! names. The file store wraps that tree in a small checksummed header
//! (magic, version, CRC32, payload length) with a bincode payload.

use anyhow::{Context, Result};
use crc32fast::Hasher;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use tankworks_core::{FluidStack, TagCompound};

use crate::broadcast::BroadcastLevel;
use crate::inventory::FluidInventory;

/// Magic number identifying a tank file ("TWTK" = tankworks tank).
const TANK_MAGIC: u32 = 0x5457_544B;

/// Current tank file format version.
const TANK_VERSION: u16 = 1;

impl FluidInventory {
    /// Record every filled tank into `destination` under its layout name.
    /// Empty tanks are skipped entirely, so their names are simply absent
    /// from the output.
    pub fn write_tag(&self, destination: &mut TagCompound) {
        for (name, slot) in self.names.iter().zip(&self.slots) {
            if let Some(stack) = slot {
                destination.set_compound(name.clone(), stack.to_tag());
            }
        }
    }

    /// Restore tank contents from `source`. Names absent from the source
    /// leave their tanks untouched.
    ///
    /// Loaded levels also seed the broadcast snapshot, so a freshly
    /// loaded inventory does not immediately re-broadcast levels that
    /// have not changed since the save.
    pub fn read_tag(&mut self, source: &TagCompound) -> Result<()> {
        for tank in 0..self.slots.len() {
            let Some(tag) = source.compound(&self.names[tank]) else {
                continue;
            };
            let stack = FluidStack::from_tag(tag)
                .with_context(|| format!("Failed to decode tank `{}`", self.names[tank]))?;
            self.last_broadcast[tank] = BroadcastLevel::At(stack.amount());
            self.slots[tank] = Some(stack);
        }
        Ok(())
    }
}

/// Write a tank tag tree to `path`, creating parent directories as
/// needed.
pub fn save_tank_file<P: AsRef<Path>>(path: P, tag: &TagCompound) -> Result<()> {
    let path = path.as_ref();
    let payload = bincode::serialize(tag).context("Failed to serialize tank data")?;

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    let crc32 = hasher.finalize();

    let mut bytes = Vec::with_capacity(14 + payload.len());
    bytes.extend_from_slice(&TANK_MAGIC.to_le_bytes());
    bytes.extend_from_slice(&TANK_VERSION.to_le_bytes());
    bytes.extend_from_slice(&crc32.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&payload);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create tank file directory")?;
    }
    let mut file = File::create(path).context("Failed to create tank file")?;
    file.write_all(&bytes).context("Failed to write tank file")?;
    Ok(())
}

/// Load a tank tag tree previously written by [`save_tank_file`].
pub fn load_tank_file<P: AsRef<Path>>(path: P) -> Result<TagCompound> {
    let mut file = File::open(path.as_ref()).context("Failed to open tank file")?;

    let mut header = [0u8; 14];
    file.read_exact(&mut header)
        .context("Failed to read tank file header")?;

    let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    if magic != TANK_MAGIC {
        anyhow::bail!(
            "Invalid tank file magic: expected 0x{:08X}, got 0x{:08X}",
            TANK_MAGIC,
            magic
        );
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != TANK_VERSION {
        anyhow::bail!("Unsupported tank file version {version}");
    }

    let expected_crc = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
    let payload_len = u32::from_le_bytes([header[10], header[11], header[12], header[13]]);

    let mut payload = vec![0u8; payload_len as usize];
    file.read_exact(&mut payload)
        .context("Failed to read tank file payload")?;

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    if hasher.finalize() != expected_crc {
        anyhow::bail!("Tank file checksum mismatch");
    }

    bincode::deserialize(&payload).context("Failed to decode tank data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::CapacityMode;
    use crate::layout::StaticLayout;
    use std::sync::Arc;
    use tankworks_core::{FluidId, TagValue};

    fn stack(key: &str, amount: u32) -> FluidStack {
        FluidStack::new(FluidId::new(key).unwrap(), amount).unwrap()
    }

    fn fuel_waste_bank() -> FluidInventory {
        let mut inv = FluidInventory::new(
            Arc::new(StaticLayout::open(&["fuel", "waste"])),
            CapacityMode::SharedTank,
        )
        .unwrap();
        inv.set_capacity(1000);
        inv
    }

    #[test]
    fn write_skips_empty_tanks() {
        let mut inv = fuel_waste_bank();
        inv.fill(0, &stack("yellorium", 600), true);

        let mut tag = TagCompound::new();
        inv.write_tag(&mut tag);

        assert!(tag.contains_key("fuel"));
        assert!(!tag.contains_key("waste"));
    }

    #[test]
    fn write_then_clear_then_read_restores_contents() {
        let mut inv = fuel_waste_bank();
        inv.fill(0, &stack("yellorium", 600), true);
        inv.fill(1, &stack("cyanite", 250), true);

        let mut tag = TagCompound::new();
        inv.write_tag(&mut tag);

        let mut fresh = fuel_waste_bank();
        fresh.read_tag(&tag).unwrap();

        assert_eq!(fresh.fluid_type(0), Some(&FluidId::new("yellorium").unwrap()));
        assert_eq!(fresh.fluid_amount(0), 600);
        assert_eq!(fresh.fluid_type(1), Some(&FluidId::new("cyanite").unwrap()));
        assert_eq!(fresh.fluid_amount(1), 250);
    }

    #[test]
    fn absent_names_leave_tanks_untouched() {
        let mut inv = fuel_waste_bank();
        inv.fill(0, &stack("yellorium", 600), true);

        let mut tag = TagCompound::new();
        inv.write_tag(&mut tag);

        let mut fresh = fuel_waste_bank();
        fresh.read_tag(&tag).unwrap();
        assert_eq!(fresh.fluid_type(1), None);
    }

    #[test]
    fn load_does_not_pend_a_broadcast() {
        let mut inv = fuel_waste_bank();
        inv.fill(0, &stack("yellorium", 600), true);

        let mut tag = TagCompound::new();
        inv.write_tag(&mut tag);

        let mut fresh = fuel_waste_bank();
        fresh.read_tag(&tag).unwrap();

        // The loaded level seeded the snapshot: the first gated scan sees
        // no change and stays quiet.
        for _ in 0..crate::broadcast::MIN_TICKS_BETWEEN_UPDATES {
            assert!(!fresh.should_send_update());
        }
        assert!(!fresh.should_send_update());
    }

    #[test]
    fn read_rejects_malformed_stacks() {
        let mut bad_stack = TagCompound::new();
        bad_stack.set_text("fluid", "yellorium");
        bad_stack.set_int("amount", 0);

        let mut tag = TagCompound::new();
        tag.set_compound("fuel", bad_stack);

        let mut inv = fuel_waste_bank();
        let err = inv.read_tag(&tag).unwrap_err();
        assert!(err.to_string().contains("fuel"));
    }

    #[test]
    fn tank_file_roundtrip() {
        let mut inv = fuel_waste_bank();
        inv.fill(0, &stack("yellorium", 600), true);
        inv.fill(1, &stack("cyanite", 250), true);

        let mut tag = TagCompound::new();
        inv.write_tag(&mut tag);

        let path = std::env::temp_dir().join(format!(
            "tankworks_roundtrip_{}.twk",
            std::process::id()
        ));
        save_tank_file(&path, &tag).unwrap();
        let loaded = load_tank_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, tag);
    }

    #[test]
    fn tank_file_rejects_bad_magic() {
        let path = std::env::temp_dir().join(format!(
            "tankworks_badmagic_{}.twk",
            std::process::id()
        ));
        fs::write(&path, [0u8; 32]).unwrap();

        let err = load_tank_file(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn tank_file_rejects_corrupted_payload() {
        let mut tag = TagCompound::new();
        tag.set_int("amount", 42);

        let path = std::env::temp_dir().join(format!(
            "tankworks_corrupt_{}.twk",
            std::process::id()
        ));
        save_tank_file(&path, &tag).unwrap();

        // Flip a payload byte past the header.
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        let err = load_tank_file(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn written_tag_shape_is_stable() {
        let mut inv = fuel_waste_bank();
        inv.fill(0, &stack("yellorium", 600), true);

        let mut tag = TagCompound::new();
        inv.write_tag(&mut tag);

        let fuel = tag.compound("fuel").unwrap();
        assert_eq!(fuel.text("fluid"), Some("yellorium"));
        assert_eq!(fuel.int("amount"), Some(600));
        assert!(matches!(tag.remove("fuel"), Some(TagValue::Compound(_))));
    }
}
