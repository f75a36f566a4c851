//! Reconstructed net (wire) entities.

use crate::ids::{PortId, WireId};
use crate::signal::SignalVector;
use serde::{Deserialize, Serialize};

/// A reconstructed net: every port in `drivers`, `riders`, and `laterals`
/// shares the same canonical [`SignalVector`] (see
/// [`SignalVector::canonical`]). Produced by the Net Builder from the
/// groupings over that canonical key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wire {
    /// This wire's own id.
    pub id: WireId,
    /// The signal vector shared by every port on this wire.
    pub signal: SignalVector,
    /// Output ports driving this net.
    pub drivers: Vec<PortId>,
    /// Input ports reading this net.
    pub riders: Vec<PortId>,
    /// Inout ports participating bidirectionally in this net.
    pub laterals: Vec<PortId>,
}

impl Wire {
    /// Creates a new, driver/rider/lateral-free wire for the given signal.
    pub fn new(id: WireId, signal: SignalVector) -> Self {
        Self {
            id,
            signal,
            drivers: Vec::new(),
            riders: Vec::new(),
            laterals: Vec::new(),
        }
    }

    /// `true` if this net has no driver and is not a lateral connection —
    /// a floating net, which the Layout Request Builder must still route.
    pub fn is_undriven(&self) -> bool {
        self.drivers.is_empty() && self.laterals.is_empty()
    }

    /// `true` if more than one port drives this net (a fan-out point that
    /// the Layout Request Builder must inject a dummy node for).
    pub fn is_multi_driver(&self) -> bool {
        self.drivers.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;
    use schem_common::ArenaId;

    #[test]
    fn fresh_wire_is_undriven() {
        let wire = Wire::new(WireId::from_raw(0), SignalVector::new(vec![Signal::Bit(1)]));
        assert!(wire.is_undriven());
        assert!(!wire.is_multi_driver());
    }

    #[test]
    fn multi_driver_detection() {
        let mut wire = Wire::new(WireId::from_raw(0), SignalVector::new(vec![Signal::Bit(1)]));
        wire.drivers.push(PortId::from_raw(0));
        wire.drivers.push(PortId::from_raw(1));
        assert!(wire.is_multi_driver());
        assert!(!wire.is_undriven());
    }
}
