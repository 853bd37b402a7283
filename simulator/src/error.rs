//! Runtime errors raised while executing a loaded program.
//!
//! Mirrors `lc3_assembler::error`'s plain-enum-plus-`Display` style: no
//! `thiserror`, just a `Display` impl and `std::error::Error`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Opcode `1101` is reserved, or a TRAP named a vector this core doesn't implement.
    IllegalInstruction { code: u16 },
    /// `RTI` executed outside supervisor mode. This core never enters one.
    PrivilegedInstruction,
    /// A store (`ST`, `STI`, `STR`) targeted an address below `0x3000`.
    IllegalMemory { address: u16 },
    /// Malformed object image, or a host I/O failure (file, terminal, stdout).
    Io(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::IllegalInstruction { code } => {
                write!(f, "illegal instruction: x{:04X}", code)
            }
            RuntimeError::PrivilegedInstruction => {
                write!(f, "privileged instruction: RTI requires supervisor mode")
            }
            RuntimeError::IllegalMemory { address } => write!(
                f,
                "illegal memory access: store to x{:04X} is below user space (x3000)",
                address
            ),
            RuntimeError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for RuntimeError {}
