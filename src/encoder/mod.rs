//! LC-3 Machine Code Encoder
//!
//! This module converts parsed LC-3 assembly code into binary machine code.
//! It implements the complete LC-3 Instruction Set Architecture (ISA).
//!
//! ## Supported Instructions
//!
//! - **Operate**: ADD, AND, NOT
//! - **Data Movement**: LD, LDI, LDR, LEA, ST, STI, STR
//! - **Control Flow**: BR (with condition codes), JMP, JSR, JSRR, RTI, RET
//! - **Trap**: TRAP, GETC, OUT, PUTS, IN, PUTSP, HALT
//!
//! ## Directives
//!
//! - **.ORIG** - Set origin address
//! - **.FILL** - Fill one word with value or label address
//! - **.BLKW** - Allocate block of words
//! - **.STRINGZ** - Store null-terminated string
//! - **.END** - End of program

use crate::bitfield::FieldBuilder;
use crate::error::{AsmError, ErrorKind, Span};
use crate::first_pass::{symbol_table::SymbolTable, FirstPassResult};
use crate::parser::ast::{Instruction, LabelOrOffset, LineContent, SourceLine};

// LC-3 opcode constants — bits 15:12 of every instruction word.
const OP_ADD: u16 = 0b0001;
const OP_AND: u16 = 0b0101;
const OP_NOT: u16 = 0b1001;
const OP_LD: u16 = 0b0010;
const OP_LDI: u16 = 0b1010;
const OP_LEA: u16 = 0b1110;
const OP_ST: u16 = 0b0011;
const OP_STI: u16 = 0b1011;
const OP_LDR: u16 = 0b0110;
const OP_STR: u16 = 0b0111;
const OP_BR: u16 = 0b0000;
const OP_JMP: u16 = 0b1100;
const OP_JSR: u16 = 0b0100;
const OP_TRAP: u16 = 0b1111;
const OP_RTI: u16 = 0b1000;

/// Build a full TRAP instruction word for a fixed, known-good 8-bit vector.
fn trap_word(vector: u8) -> u16 {
    FieldBuilder::new()
        .place(OP_TRAP, 4)
        .place(0, 4)
        .place(vector as u16, 8)
        .word()
}

/// Result of the encoding process
pub struct EncodeResult {
    /// Generated machine code as 16-bit words
    pub machine_code: Vec<u16>,
    /// Origin address where program should be loaded
    pub orig_address: u16,
    /// Errors encountered during encoding
    pub errors: Vec<AsmError>,
}

/// Encode the assembled program into LC-3 machine code
///
/// This function performs the second pass of the assembler, converting
/// the parsed AST and symbol table into binary machine code.
///
/// # Arguments
///
/// * `first_pass` - Result from the first pass containing AST and symbol table
///
/// # Returns
///
/// An `EncodeResult` containing the machine code and any errors encountered
#[must_use]
pub fn encode(first_pass: &FirstPassResult) -> EncodeResult {
    let mut encoder = Encoder::new(&first_pass.symbol_table, first_pass.orig_address);

    for line in &first_pass.source_lines {
        encoder.encode_line(line);
    }

    EncodeResult {
        machine_code: encoder.machine_code,
        orig_address: encoder.orig_address,
        errors: encoder.errors,
    }
}

struct Encoder<'a> {
    symbol_table: &'a SymbolTable,
    machine_code: Vec<u16>,
    orig_address: u16,
    current_address: u16,
    errors: Vec<AsmError>,
}

impl<'a> Encoder<'a> {
    fn new(symbol_table: &'a SymbolTable, orig_address: u16) -> Self {
        Self {
            symbol_table,
            machine_code: Vec::new(),
            orig_address,
            current_address: orig_address,
            errors: Vec::new(),
        }
    }

    fn encode_line(&mut self, line: &SourceLine) {
        match &line.content {
            LineContent::Empty => {}
            LineContent::Orig(_) => {} // Already handled in first pass
            LineContent::End => {}     // End of program
            LineContent::FillImmediate(value) => {
                self.emit(*value as u16);
            }
            LineContent::FillLabel(label) => match self.symbol_table.get(label) {
                Some(addr) => self.emit(addr),
                None => {
                    self.errors
                        .push(AsmError::undefined_label(label, line.span));
                    self.emit(0);
                }
            },
            LineContent::Blkw(count) => {
                for _ in 0..*count {
                    self.emit(0);
                }
            }
            LineContent::Stringz(s) => {
                for ch in s.chars() {
                    self.emit(ch as u16);
                }
                self.emit(0); // Null terminator
            }
            LineContent::Instruction(inst) => {
                self.encode_instruction(inst, line.span);
            }
        }
    }

    fn encode_instruction(&mut self, inst: &Instruction, span: Span) {
        let encoded = match inst {
            // Operate instructions
            Instruction::AddReg { dr, sr1, sr2 } => FieldBuilder::new()
                .place(OP_ADD, 4)
                .place(*dr as u16, 3)
                .place(*sr1 as u16, 3)
                .place(0, 3) // mode bit + 2 unused bits
                .place(*sr2 as u16, 3)
                .word(),
            Instruction::AddImm { dr, sr1, imm5 } => FieldBuilder::new()
                .place(OP_ADD, 4)
                .place(*dr as u16, 3)
                .place(*sr1 as u16, 3)
                .place(1, 1) // immediate mode
                .place(truncate_field(*imm5, 5), 5)
                .word(),
            Instruction::AndReg { dr, sr1, sr2 } => FieldBuilder::new()
                .place(OP_AND, 4)
                .place(*dr as u16, 3)
                .place(*sr1 as u16, 3)
                .place(0, 3)
                .place(*sr2 as u16, 3)
                .word(),
            Instruction::AndImm { dr, sr1, imm5 } => FieldBuilder::new()
                .place(OP_AND, 4)
                .place(*dr as u16, 3)
                .place(*sr1 as u16, 3)
                .place(1, 1)
                .place(truncate_field(*imm5, 5), 5)
                .word(),
            Instruction::Not { dr, sr } => FieldBuilder::new()
                .place(OP_NOT, 4)
                .place(*dr as u16, 3)
                .place(*sr as u16, 3)
                .place(0b111111, 6)
                .word(),

            // Data movement with PC offset
            Instruction::Ld { dr, target } => {
                let offset = self.calc_pc_offset(target, 9, span);
                FieldBuilder::new()
                    .place(OP_LD, 4)
                    .place(*dr as u16, 3)
                    .place(offset, 9)
                    .word()
            }
            Instruction::Ldi { dr, target } => {
                let offset = self.calc_pc_offset(target, 9, span);
                FieldBuilder::new()
                    .place(OP_LDI, 4)
                    .place(*dr as u16, 3)
                    .place(offset, 9)
                    .word()
            }
            Instruction::Lea { dr, target } => {
                let offset = self.calc_pc_offset(target, 9, span);
                FieldBuilder::new()
                    .place(OP_LEA, 4)
                    .place(*dr as u16, 3)
                    .place(offset, 9)
                    .word()
            }
            Instruction::St { sr, target } => {
                let offset = self.calc_pc_offset(target, 9, span);
                FieldBuilder::new()
                    .place(OP_ST, 4)
                    .place(*sr as u16, 3)
                    .place(offset, 9)
                    .word()
            }
            Instruction::Sti { sr, target } => {
                let offset = self.calc_pc_offset(target, 9, span);
                FieldBuilder::new()
                    .place(OP_STI, 4)
                    .place(*sr as u16, 3)
                    .place(offset, 9)
                    .word()
            }

            // Data movement with base+offset
            Instruction::Ldr {
                dr,
                base_r,
                offset6,
            } => FieldBuilder::new()
                .place(OP_LDR, 4)
                .place(*dr as u16, 3)
                .place(*base_r as u16, 3)
                .place(truncate_field(*offset6, 6), 6)
                .word(),
            Instruction::Str {
                sr,
                base_r,
                offset6,
            } => FieldBuilder::new()
                .place(OP_STR, 4)
                .place(*sr as u16, 3)
                .place(*base_r as u16, 3)
                .place(truncate_field(*offset6, 6), 6)
                .word(),

            // Branch
            Instruction::Br { flags, target } => {
                let offset = self.calc_pc_offset(target, 9, span);
                // BrFlags::as_u16() encodes [N][Z][P] as a 3-bit value.
                FieldBuilder::new()
                    .place(OP_BR, 4)
                    .place(flags.as_u16(), 3)
                    .place(offset, 9)
                    .word()
            }

            // Jump
            Instruction::Jmp { base_r } => FieldBuilder::new()
                .place(OP_JMP, 4)
                .place(0, 3)
                .place(*base_r as u16, 3)
                .place(0, 6)
                .word(),
            Instruction::Ret => {
                // RET is encoded as JMP R7
                FieldBuilder::new()
                    .place(OP_JMP, 4)
                    .place(0, 3)
                    .place(7, 3)
                    .place(0, 6)
                    .word()
            }

            // Subroutine
            Instruction::Jsr { target } => {
                let offset = self.calc_pc_offset(target, 11, span);
                FieldBuilder::new()
                    .place(OP_JSR, 4)
                    .place(1, 1) // PC-relative mode
                    .place(offset, 11)
                    .word()
            }
            Instruction::Jsrr { base_r } => FieldBuilder::new()
                .place(OP_JSR, 4)
                .place(0, 3) // register mode + 2 unused bits
                .place(*base_r as u16, 3)
                .place(0, 6)
                .word(),

            // Trap
            Instruction::Trap { trapvect8 } => trap_word(*trapvect8),
            Instruction::Getc => trap_word(0x20),
            Instruction::Out => trap_word(0x21),
            Instruction::Puts => trap_word(0x22),
            Instruction::In => trap_word(0x23),
            Instruction::Putsp => trap_word(0x24),
            Instruction::Halt => trap_word(0x25),

            // System
            Instruction::Rti => FieldBuilder::new().place(OP_RTI, 4).place(0, 12).word(),
        };

        self.emit(encoded);
    }

    /// Calculate the offset field for a PC-relative operand.
    ///
    /// A literal offset (`#n` / `xN`) is taken directly and truncated to
    /// `bits`; the parser already range-checked it against the signed
    /// `bits`-bit width when it was read (see `expect_label_or_offset`).
    ///
    /// A label is resolved against the symbol table and turned into a
    /// PC-relative offset:
    /// 1. During execution, PC points to the NEXT instruction (current + 1)
    /// 2. The offset is added to this incremented PC: effective_address = PC + offset
    /// 3. Therefore: offset = target_address - (current_address + 1)
    ///
    /// The offset must fit in the specified number of bits as a signed value.
    /// For example, with 9 bits: range is -256 to +255
    fn calc_pc_offset(&mut self, target: &LabelOrOffset, bits: u8, span: Span) -> u16 {
        let label = match target {
            LabelOrOffset::Offset(value) => return truncate_field(*value, bits),
            LabelOrOffset::Label(label) => label,
        };
        match self.symbol_table.get(label) {
            Some(target_addr) => {
                // PC will point to next instruction during execution
                let pc = self.current_address.wrapping_add(1);

                // Calculate signed offset from PC to target
                let offset = (target_addr as i32) - (pc as i32);

                // Check if offset fits in the specified number of bits (signed range)
                let max_offset = (1 << (bits - 1)) - 1;
                let min_offset = -(1 << (bits - 1));

                if offset < min_offset || offset > max_offset {
                    self.errors.push(AsmError {
                        kind: ErrorKind::OffsetOutOfRange,
                        message: format!(
                            "PC offset {} to label '{}' exceeds {}-bit range [{}, {}]",
                            offset, label, bits, min_offset, max_offset
                        ),
                        span,
                    });
                    0 // Use 0 on error, but error is recorded
                } else {
                    // Mask to keep only the lower 'bits' bits (preserves two's complement)
                    (offset as u16) & ((1 << bits) - 1)
                }
            }
            None => {
                self.errors.push(AsmError::undefined_label(label, span));
                0
            }
        }
    }

    fn emit(&mut self, word: u16) {
        self.machine_code.push(word);
        self.current_address = self.current_address.wrapping_add(1);
    }
}

/// Truncate a signed value to N bits, preserving two's complement representation.
///
/// The parser has already range-checked `value` against the field's signed
/// range, so this only needs to mask off the low `bits` bits:
/// - Positive values: low bits are kept as-is
/// - Negative values: low bits already hold the two's complement encoding
///
/// Example: `truncate_field(-1, 5) == 0b11111` (5-bit representation of -1).
const fn truncate_field(value: i16, bits: u8) -> u16 {
    let mask = (1 << bits) - 1;
    (value as u16) & mask
}
