//! SI unit newtypes for the quantities that cross module boundaries.
//!
//! Raw sweep arrays stay plain `f64` (amperes for bias, volts for scaled
//! voltage). Scalars that are configured by the operator or returned by a
//! reduction are wrapped so that a threshold in volts cannot be passed where
//! a bias in amperes is expected.

use std::fmt;
use std::ops::Mul;

use serde::{Deserialize, Serialize};

macro_rules! unit {
    ($(#[$meta:meta])* $name:ident, $symbol:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            pub const SYMBOL: &'static str = $symbol;

            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:e} {}", self.0, Self::SYMBOL)
            }
        }
    };
}

unit!(
    /// Current in amperes.
    Amperes,
    "A"
);
unit!(
    /// Voltage in volts.
    Volts,
    "V"
);
unit!(
    /// Resistance in ohms.
    Ohms,
    "Ω"
);
unit!(
    /// Magnetic field in tesla.
    Tesla,
    "T"
);

impl Mul<Ohms> for Amperes {
    type Output = Volts;

    fn mul(self, rhs: Ohms) -> Volts {
        Volts(self.0 * rhs.0)
    }
}

impl Mul<Amperes> for Ohms {
    type Output = Volts;

    fn mul(self, rhs: Amperes) -> Volts {
        rhs * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohms_law_product() {
        let v = Amperes(2e-6) * Ohms(150.0);
        assert!((v.value() - 3e-4).abs() < 1e-18);
        assert_eq!(Ohms(150.0) * Amperes(2e-6), v);
    }

    #[test]
    fn display_carries_the_unit_symbol() {
        assert_eq!(Ohms(150.0).to_string(), "1.5e2 Ω");
        assert_eq!(Amperes(2e-6).to_string(), "2e-6 A");
    }

    #[test]
    fn units_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&Volts(1e-4)).unwrap();
        assert_eq!(json, "0.0001");
        let back: Volts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Volts(1e-4));
    }
}
