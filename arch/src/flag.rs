use num_enum::IntoPrimitive;
use serde::{Deserialize, Serialize};

/// Status register bit positions.
///
/// The layout is the interpreter's own (N in bit 0, C in bit 7), not the
/// hardware NV-BDIZC order. Register dumps print bit 0 first, so the
/// rendered string still reads N, V, R, B, D, I, Z, C left to right.
/// Bit 2 is the reserved bit, set after every reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoPrimitive)]
#[repr(u8)]
pub enum Flag {
    N = 0,
    V = 1,
    R = 2,
    B = 3,
    D = 4,
    I = 5,
    Z = 6,
    C = 7,
}

impl Flag {
    pub fn mask(self) -> u8 {
        1 << u8::from(self)
    }
}

#[test]
fn test() {
    assert_eq!(Flag::N.mask(), 0b0000_0001);
    assert_eq!(Flag::R.mask(), 0b0000_0100);
    assert_eq!(Flag::C.mask(), 0b1000_0000);
}
