//! Strongly typed identifiers.
//!
//! Ids are dense `u32` indices handed out at initialization (vehicles,
//! chargers, nodes, links) or by the demand source (requests, passengers).
//! They are `Copy + Ord + Hash`; the `Ord` impl is what the dispatcher uses
//! for deterministic tie-breaking ("lowest vehicle id wins").

use std::fmt;

/// Generate a typed id wrapper that displays with a short prefix.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty) => $prefix:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel for "no such id".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Position in a dense registry `Vec`.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($prefix, "{}"), self.0)
                } else {
                    f.write_str(concat!($prefix, "?"))
                }
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// A fleet vehicle.  Dense: `0..fleet.len()`.
    pub struct VehicleId(u32) => "veh";
}

typed_id! {
    /// A trip request, unique over the whole run.
    pub struct RequestId(u32) => "req";
}

typed_id! {
    /// The person travelling on a request.
    pub struct PassengerId(u32) => "pax";
}

typed_id! {
    /// A charger in the charging infrastructure.  Dense.
    pub struct ChargerId(u32) => "chg";
}

typed_id! {
    /// A road-network node.
    pub struct NodeId(u32) => "node";
}

typed_id! {
    /// A directed road-network link.
    pub struct LinkId(u32) => "link";
}
