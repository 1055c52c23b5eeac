//! Run status flags, exposed as a bitmask only at the exit boundary.

/// Outcome classes observed during one run. Flags can be set, never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    unsafe_found: bool,
    lookup_failed: bool,
    invalid_input: bool,
    output_failed: bool,
}

impl StatusFlags {
    pub const UNSAFE_FOUND: i32 = 1;
    pub const LOOKUP_FAILED: i32 = 2;
    pub const INVALID_INPUT: i32 = 4;
    pub const OUTPUT_FAILED: i32 = 8;

    pub fn mark_unsafe_found(&mut self) {
        self.unsafe_found = true;
    }

    pub fn mark_lookup_failed(&mut self) {
        self.lookup_failed = true;
    }

    pub fn mark_invalid_input(&mut self) {
        self.invalid_input = true;
    }

    pub fn mark_output_failed(&mut self) {
        self.output_failed = true;
    }

    pub fn unsafe_found(&self) -> bool {
        self.unsafe_found
    }

    pub fn lookup_failed(&self) -> bool {
        self.lookup_failed
    }

    pub fn invalid_input(&self) -> bool {
        self.invalid_input
    }

    pub fn output_failed(&self) -> bool {
        self.output_failed
    }

    /// True when every URL was safe and nothing failed.
    pub fn is_clean(&self) -> bool {
        *self == StatusFlags::default()
    }

    /// Process exit status: 0 = all safe, otherwise the OR of the set bits.
    pub fn exit_code(&self) -> i32 {
        let mut code = 0;
        if self.unsafe_found {
            code |= Self::UNSAFE_FOUND;
        }
        if self.lookup_failed {
            code |= Self::LOOKUP_FAILED;
        }
        if self.invalid_input {
            code |= Self::INVALID_INPUT;
        }
        if self.output_failed {
            code |= Self::OUTPUT_FAILED;
        }
        code
    }
}
