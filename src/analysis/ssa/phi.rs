//! Phi functions.
//!
//! A phi function `v3_4 = PHI(v3_1, v3_2)` sits at the head of a join block
//! and selects one incoming version of a register: operand `j` is the version
//! live at the end of the block's `j`-th predecessor.
//!
//! Phis are created during placement with every operand set to the entry
//! value of their register, then renamed in place.

use std::fmt;

use crate::{analysis::ssa::SsaName, code::Register};

/// Handle of a phi function in an [`SsaGraph`](crate::analysis::ssa::SsaGraph).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhiId(pub(crate) usize);

impl PhiId {
    /// Creates a handle for the phi at `index`.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        PhiId(index)
    }

    /// Position of the phi in its graph's phi arena.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for PhiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhiId({})", self.0)
    }
}

impl fmt::Display for PhiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phi{}", self.0)
    }
}

/// A phi function for one register.
///
/// # Examples
///
/// ```rust
/// use dexscope::analysis::ssa::PhiFunction;
///
/// let phi = PhiFunction::new(3, 2);
/// assert_eq!(phi.original(), 3);
/// assert_eq!(phi.to_string(), "v3_0 = PHI(v3_0, v3_0)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiFunction {
    original: Register,
    destination: SsaName,
    operands: Vec<SsaName>,
}

impl PhiFunction {
    /// Creates a phi for `register` with one operand per predecessor.
    #[must_use]
    pub fn new(register: Register, arity: usize) -> Self {
        PhiFunction {
            original: register,
            destination: SsaName::entry(register),
            operands: vec![SsaName::entry(register); arity],
        }
    }

    /// The register this phi merges, as it was before renaming.
    #[must_use]
    pub fn original(&self) -> Register {
        self.original
    }

    /// The defined version.
    #[must_use]
    pub fn destination(&self) -> SsaName {
        self.destination
    }

    /// Incoming versions, one per predecessor block in predecessor order.
    #[must_use]
    pub fn operands(&self) -> &[SsaName] {
        &self.operands
    }

    /// Number of operands.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.operands.len()
    }

    pub(crate) fn set_destination(&mut self, version: u32) {
        self.destination = SsaName::new(self.original, version);
    }

    /// Returns `false` if `slot` is out of range.
    pub(crate) fn set_operand(&mut self, slot: usize, version: u32) -> bool {
        match self.operands.get_mut(slot) {
            Some(operand) => {
                *operand = SsaName::new(self.original, version);
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for PhiFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = PHI(", self.destination)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{operand}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_phi() {
        let phi = PhiFunction::new(3, 2);
        assert_eq!(phi.original(), 3);
        assert_eq!(phi.arity(), 2);
        assert_eq!(phi.destination(), SsaName::entry(3));
        assert_eq!(phi.to_string(), "v3_0 = PHI(v3_0, v3_0)");
    }

    #[test]
    fn test_rename_in_place() {
        let mut phi = PhiFunction::new(1, 2);
        phi.set_destination(4);
        assert!(phi.set_operand(1, 2));
        assert!(!phi.set_operand(2, 9));

        assert_eq!(phi.original(), 1);
        assert_eq!(phi.operands(), &[SsaName::new(1, 0), SsaName::new(1, 2)]);
        assert_eq!(phi.to_string(), "v1_4 = PHI(v1_0, v1_2)");
    }

    #[test]
    fn test_phi_id() {
        assert_eq!(PhiId::new(5).index(), 5);
        assert_eq!(PhiId::new(5).to_string(), "phi5");
        assert_eq!(format!("{:?}", PhiId::new(5)), "PhiId(5)");
    }
}
