//! # LC-3 Emulator
//!
//! Loads an assembled LC-3 object image and runs it against a simulated
//! CPU, memory, and TRAP service layer.
//!
//! ## Pipeline
//!
//! 1. **Loader** - reads the object image, places words in memory
//! 2. **CPU** - fetch-decode-execute loop over the loaded program
//! 3. **TRAP routines** - GETC/OUT/PUTS/IN/PUTSP/HALT, against a `KeySource`
//!
//! ## Example
//!
//! ```rust,no_run
//! use lc3_emulator::cpu::Cpu;
//! use lc3_emulator::keysource::ScriptedKeys;
//!
//! let bytes = std::fs::read("program.lc3").unwrap();
//! let mut cpu = Cpu::new();
//! cpu.load(&bytes).unwrap();
//!
//! let mut keys = ScriptedKeys::new([]);
//! let mut out = std::io::stdout();
//! cpu.run(&mut keys, &mut out).unwrap();
//! ```

pub mod cpu;
pub mod error;
pub mod keysource;
pub mod loader;
pub mod memory;
pub mod registers;
