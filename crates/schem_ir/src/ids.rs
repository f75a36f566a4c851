//! Arena ID newtypes for flat IR entities.

use schem_common::ArenaId;

macro_rules! define_id {
    ($name:ident) => {
        /// Opaque handle into the arena that owns this entity kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                $name(index)
            }
            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(CellId);
define_id!(PortId);
define_id!(WireId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_raw_index() {
        let id = CellId::from_raw(7);
        assert_eq!(id.as_raw(), 7);
    }

    #[test]
    fn distinct_id_types_do_not_mix() {
        let cell = CellId::from_raw(0);
        let port = PortId::from_raw(0);
        assert_eq!(cell.as_raw(), port.as_raw());
    }
}
