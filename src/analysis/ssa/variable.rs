//! SSA variable names.
//!
//! In SSA form every definition of a register gets a fresh version number, so
//! a variable is the pair of the original register and that version. Version 0
//! is the value a register holds on entry to the method (a parameter, or
//! undefined).

use std::fmt;

use crate::code::Register;

/// A renamed register: `v<register>_<version>`.
///
/// # Examples
///
/// ```rust
/// use dexscope::analysis::ssa::SsaName;
///
/// let name = SsaName::new(3, 2);
/// assert_eq!(name.to_string(), "v3_2");
/// assert!(SsaName::entry(3).is_entry_value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SsaName {
    register: Register,
    version: u32,
}

impl SsaName {
    /// Creates the name of `version` of `register`.
    #[must_use]
    pub const fn new(register: Register, version: u32) -> Self {
        SsaName { register, version }
    }

    /// The value `register` holds when the method is entered.
    #[must_use]
    pub const fn entry(register: Register) -> Self {
        SsaName {
            register,
            version: 0,
        }
    }

    /// The original register.
    #[must_use]
    pub const fn register(&self) -> Register {
        self.register
    }

    /// The version number; 0 for the entry value.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns `true` for the entry value of the register.
    #[must_use]
    pub const fn is_entry_value(&self) -> bool {
        self.version == 0
    }
}

impl fmt::Display for SsaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}_{}", self.register, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        let name = SsaName::new(4, 7);
        assert_eq!(name.register(), 4);
        assert_eq!(name.version(), 7);
        assert!(!name.is_entry_value());
        assert_eq!(name.to_string(), "v4_7");
        assert_eq!(SsaName::entry(4), SsaName::new(4, 0));
    }
}
