//! Tank layouts: host-supplied policy for an inventory's tanks.
//!
//! A layout answers three questions the inventory cannot answer itself:
//! how many tanks there are, what each tank is called in save data, and
//! which fluids an empty tank may accept.

use tankworks_core::FluidId;

/// Host-supplied description of an inventory's tanks.
///
/// Queried once when the inventory is constructed; the answers are fixed
/// for the inventory's lifetime. `tank_names` must return exactly
/// `tank_count` distinct strings — the constructor rejects layouts that
/// do not.
pub trait TankLayout: Send + Sync {
    /// Number of tanks. Must be at least 1.
    fn tank_count(&self) -> usize;

    /// Stable save names, one per tank.
    fn tank_names(&self) -> Vec<String>;

    /// Whether `fluid` may enter an *empty* `tank`. A filled tank only
    /// accepts more of the fluid it already holds; this predicate is not
    /// consulted for it.
    fn is_fluid_valid(&self, tank: usize, fluid: &FluidId) -> bool;
}

/// Fixed layout built from plain data: a name per tank plus an optional
/// allow-list per tank (`None` accepts any fluid).
#[derive(Debug, Clone)]
pub struct StaticLayout {
    names: Vec<String>,
    allowed: Vec<Option<Vec<FluidId>>>,
}

impl StaticLayout {
    /// Layout whose tanks all accept any fluid.
    pub fn open(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
            allowed: vec![None; names.len()],
        }
    }

    /// Restrict `tank` to the given fluids. Out-of-range indices are
    /// ignored.
    pub fn restrict(mut self, tank: usize, fluids: &[FluidId]) -> Self {
        if let Some(slot) = self.allowed.get_mut(tank) {
            *slot = Some(fluids.to_vec());
        }
        self
    }
}

impl TankLayout for StaticLayout {
    fn tank_count(&self) -> usize {
        self.names.len()
    }

    fn tank_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn is_fluid_valid(&self, tank: usize, fluid: &FluidId) -> bool {
        match self.allowed.get(tank) {
            Some(Some(list)) => list.contains(fluid),
            Some(None) => true,
            None => false,
        }
    }
}
