use super::*;

/// Hash rate in H/s as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct HashRate(pub f64);

impl HashRate {
    pub const ZERO: Self = Self(0.0);

    /// TH/s rounded to two decimals.
    pub fn terahash(self) -> f64 {
        units::terahash(self.0)
    }

    pub fn is_active(self) -> bool {
        self.0 > 0.0
    }
}

impl fmt::Display for HashRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        si::format_si(self.0, "H/s", f)
    }
}

impl Add for HashRate {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for HashRate {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
