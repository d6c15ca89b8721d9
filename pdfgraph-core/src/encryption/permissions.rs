//! PDF permissions according to ISO 32000-1 Table 22

use bitflags::bitflags;

bitflags! {
    /// User access permissions. Bit positions follow Table 22 (bit 1 is the
    /// least significant bit).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        /// Print the document (bit 3)
        const PRINT = 1 << 2;
        /// Modify document contents (bit 4)
        const MODIFY_CONTENTS = 1 << 3;
        /// Copy text and graphics (bit 5)
        const COPY = 1 << 4;
        /// Add or modify annotations, fill in forms (bit 6)
        const MODIFY_ANNOTATIONS = 1 << 5;
        /// Fill in existing form fields (bit 9)
        const FILL_FORMS = 1 << 8;
        /// Extract text and graphics for accessibility (bit 10)
        const ACCESSIBILITY = 1 << 9;
        /// Assemble the document (bit 11)
        const ASSEMBLE = 1 << 10;
        /// Print in high quality (bit 12)
        const PRINT_HIGH_QUALITY = 1 << 11;
    }
}

/// Bits 7-8 and 13-32 are reserved and must be set.
const RESERVED_BITS: u32 = 0xFFFF_F0C0;

impl Permissions {
    /// Value of the `P` entry: the permission bits with reserved bits set,
    /// read as a signed 32-bit integer.
    pub fn p_value(&self) -> i32 {
        (RESERVED_BITS | self.bits()) as i32
    }

    pub fn from_p_value(p: i32) -> Self {
        Self::from_bits_truncate(p as u32)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_permissions_keeps_reserved_bits() {
        let p = Permissions::empty().p_value();
        assert_eq!(p as u32, 0xFFFF_F0C0);
        assert!(p < 0);
    }

    #[test]
    fn test_all_permissions() {
        assert_eq!(Permissions::all().p_value(), -4);
        assert_eq!(Permissions::default(), Permissions::all());
    }

    #[test]
    fn test_p_value_roundtrip() {
        let perms = Permissions::PRINT | Permissions::COPY;
        let back = Permissions::from_p_value(perms.p_value());
        assert_eq!(back, perms);
        assert!(Permissions::from_p_value(-1).contains(Permissions::ASSEMBLE));
    }
}
