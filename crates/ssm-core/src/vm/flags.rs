//! Processor Flags
//!
//! Outcome bits written by `compare` and `test`, read by conditional jumps.
//! The record is closed: the only mutators clear every bit before setting
//! the outcome, so no instruction can leave a stale bit behind.

use std::cmp::Ordering;

use super::Word;

/// Comparison / test outcome bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorFlags {
    equal: bool,
    not_equal: bool,
    zero: bool,
    not_zero: bool,
    above: bool,
    below: bool,
    above_zero: bool,
    below_zero: bool,
}

impl ProcessorFlags {
    /// All flags cleared
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_all(&mut self) {
        *self = ProcessorFlags::default();
    }

    /// Record the outcome of comparing `a` (older operand) against `b`.
    pub fn record_comparison(&mut self, a: Word, b: Word) {
        self.clear_all();
        match a.cmp(&b) {
            Ordering::Less => {
                self.below = true;
                self.not_equal = true;
            }
            Ordering::Greater => {
                self.above = true;
                self.not_equal = true;
            }
            Ordering::Equal => self.equal = true,
        }
    }

    /// Record the outcome of testing `a` against zero.
    pub fn record_test(&mut self, a: Word) {
        self.clear_all();
        match a.cmp(&0) {
            Ordering::Greater => {
                self.above_zero = true;
                self.not_zero = true;
            }
            Ordering::Less => {
                self.below_zero = true;
                self.not_zero = true;
            }
            Ordering::Equal => self.zero = true,
        }
    }

    pub fn equal(&self) -> bool {
        self.equal
    }

    pub fn not_equal(&self) -> bool {
        self.not_equal
    }

    pub fn zero(&self) -> bool {
        self.zero
    }

    pub fn not_zero(&self) -> bool {
        self.not_zero
    }

    pub fn above(&self) -> bool {
        self.above
    }

    pub fn below(&self) -> bool {
        self.below
    }

    pub fn above_zero(&self) -> bool {
        self.above_zero
    }

    pub fn below_zero(&self) -> bool {
        self.below_zero
    }

    /// Names of the bits currently set, in declaration order.
    pub fn set_bits(&self) -> Vec<&'static str> {
        [
            ("equal", self.equal),
            ("not_equal", self.not_equal),
            ("zero", self.zero),
            ("not_zero", self.not_zero),
            ("above", self.above),
            ("below", self.below),
            ("above_zero", self.above_zero),
            ("below_zero", self.below_zero),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// Condition evaluated by a conditional jump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    Zero,
    NotZero,
    BelowZero,
    AboveZero,
    Equal,
    NotEqual,
    Above,
    AboveOrEqual,
    Below,
    BelowOrEqual,
}

impl JumpCondition {
    pub fn holds(self, flags: &ProcessorFlags) -> bool {
        match self {
            JumpCondition::Zero => flags.zero,
            JumpCondition::NotZero => flags.not_zero,
            JumpCondition::BelowZero => flags.below_zero,
            JumpCondition::AboveZero => flags.above_zero,
            JumpCondition::Equal => flags.equal,
            // Negation of `equal`, so it also holds after a `test`.
            JumpCondition::NotEqual => !flags.equal,
            JumpCondition::Above => flags.above,
            JumpCondition::AboveOrEqual => flags.above || flags.equal,
            JumpCondition::Below => flags.below,
            JumpCondition::BelowOrEqual => flags.below || flags.equal,
        }
    }
}
