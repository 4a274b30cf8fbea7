//! SSM Configuration
//!
//! Defines machine limits.
//! Configuration specifies constraints only; enforcement is handled by the machine.

/// Tape size of the reference configuration, in bytes.
pub const TAPE_CAPACITY: usize = 16 * 1024;

/// Machine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    /// Tape length in bytes (code and data share it)
    pub tape_capacity: usize,

    /// Maximum operand stack depth
    pub max_stack_depth: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            tape_capacity: TAPE_CAPACITY,
            max_stack_depth: 64 * 1024,
        }
    }
}

impl MachineConfig {
    /// Create a new configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Default limits with a different tape size
    pub fn with_tape_capacity(tape_capacity: usize) -> Self {
        MachineConfig {
            tape_capacity,
            ..Self::default()
        }
    }
}
