//! Fetch-decode-execute loop and TRAP service routines.

use std::io::Write;

use lc3_assembler::bitfield::{extract, sign_extend};

use crate::error::RuntimeError;
use crate::keysource::KeySource;
use crate::loader;
use crate::memory::Memory;
use crate::registers::RegisterFile;

pub struct Cpu {
    registers: RegisterFile,
    memory: Memory,
    halted: bool,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            registers: RegisterFile::new(),
            memory: Memory::new(),
            halted: false,
        }
    }

    /// Loads an object image and positions the program counter at its
    /// origin.
    pub fn load(&mut self, bytes: &[u8]) -> Result<u16, RuntimeError> {
        let result = loader::load(bytes, &mut self.memory)?;
        self.registers.pc = result.origin;
        Ok(result.origin)
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Runs until `HALT` or a runtime error.
    pub fn run(&mut self, keys: &mut dyn KeySource, out: &mut dyn Write) -> Result<(), RuntimeError> {
        while !self.halted {
            self.step(keys, out)?;
        }
        Ok(())
    }

    /// Fetches, decodes, and executes a single instruction.
    pub fn step(&mut self, keys: &mut dyn KeySource, out: &mut dyn Write) -> Result<(), RuntimeError> {
        let pc = self.registers.pc;
        let instr = self.memory.read(pc, keys);
        self.registers.pc = pc.wrapping_add(1);

        let opcode = extract(instr, 15, 4);
        match opcode {
            0b0000 => self.exec_br(instr),
            0b0001 => self.exec_add(instr),
            0b0010 => self.exec_ld(instr, keys),
            0b0011 => self.exec_st(instr)?,
            0b0100 => self.exec_jsr(instr),
            0b0101 => self.exec_and(instr),
            0b0110 => self.exec_ldr(instr, keys),
            0b0111 => self.exec_str(instr)?,
            0b1000 => return Err(RuntimeError::PrivilegedInstruction),
            0b1001 => self.exec_not(instr),
            0b1010 => self.exec_ldi(instr, keys),
            0b1011 => self.exec_sti(instr, keys)?,
            0b1100 => self.exec_jmp(instr),
            0b1101 => return Err(RuntimeError::IllegalInstruction { code: opcode }),
            0b1110 => self.exec_lea(instr),
            0b1111 => self.exec_trap(instr, keys, out)?,
            _ => unreachable!("4-bit opcode"),
        }
        Ok(())
    }

    fn exec_add(&mut self, instr: u16) {
        let dr = extract(instr, 11, 3) as u8;
        let sr1 = extract(instr, 8, 3) as u8;
        let val1 = self.registers.get(sr1);
        let val2 = if extract(instr, 5, 1) == 1 {
            sign_extend(extract(instr, 4, 5), 5)
        } else {
            self.registers.get(extract(instr, 2, 3) as u8)
        };
        let result = val1.wrapping_add(val2);
        self.registers.set(dr, result);
        self.registers.set_cc(result);
    }

    fn exec_and(&mut self, instr: u16) {
        let dr = extract(instr, 11, 3) as u8;
        let sr1 = extract(instr, 8, 3) as u8;
        let val1 = self.registers.get(sr1);
        let val2 = if extract(instr, 5, 1) == 1 {
            sign_extend(extract(instr, 4, 5), 5)
        } else {
            self.registers.get(extract(instr, 2, 3) as u8)
        };
        let result = val1 & val2;
        self.registers.set(dr, result);
        self.registers.set_cc(result);
    }

    fn exec_not(&mut self, instr: u16) {
        let dr = extract(instr, 11, 3) as u8;
        let sr = extract(instr, 8, 3) as u8;
        let result = !self.registers.get(sr);
        self.registers.set(dr, result);
        self.registers.set_cc(result);
    }

    fn exec_br(&mut self, instr: u16) {
        let n = extract(instr, 11, 1) == 1;
        let z = extract(instr, 10, 1) == 1;
        let p = extract(instr, 9, 1) == 1;
        let taken = (n && self.registers.n()) || (z && self.registers.z()) || (p && self.registers.p());
        if taken {
            let offset = sign_extend(extract(instr, 8, 9), 9);
            self.registers.pc = self.registers.pc.wrapping_add(offset);
        }
    }

    fn exec_jmp(&mut self, instr: u16) {
        let base_r = extract(instr, 8, 3) as u8;
        self.registers.pc = self.registers.get(base_r);
    }

    fn exec_jsr(&mut self, instr: u16) {
        self.registers.set(7, self.registers.pc);
        if extract(instr, 11, 1) == 1 {
            let offset = sign_extend(extract(instr, 10, 11), 11);
            self.registers.pc = self.registers.pc.wrapping_add(offset);
        } else {
            let base_r = extract(instr, 8, 3) as u8;
            self.registers.pc = self.registers.get(base_r);
        }
    }

    fn exec_ld(&mut self, instr: u16, keys: &mut dyn KeySource) {
        let dr = extract(instr, 11, 3) as u8;
        let offset = sign_extend(extract(instr, 8, 9), 9);
        let addr = self.registers.pc.wrapping_add(offset);
        let value = self.memory.read(addr, keys);
        self.registers.set(dr, value);
        self.registers.set_cc(value);
    }

    fn exec_ldi(&mut self, instr: u16, keys: &mut dyn KeySource) {
        let dr = extract(instr, 11, 3) as u8;
        let offset = sign_extend(extract(instr, 8, 9), 9);
        let ptr_addr = self.registers.pc.wrapping_add(offset);
        let addr = self.memory.read(ptr_addr, keys);
        let value = self.memory.read(addr, keys);
        self.registers.set(dr, value);
        self.registers.set_cc(value);
    }

    fn exec_ldr(&mut self, instr: u16, keys: &mut dyn KeySource) {
        let dr = extract(instr, 11, 3) as u8;
        let base_r = extract(instr, 8, 3) as u8;
        let offset = sign_extend(extract(instr, 5, 6), 6);
        let addr = self.registers.get(base_r).wrapping_add(offset);
        let value = self.memory.read(addr, keys);
        self.registers.set(dr, value);
        self.registers.set_cc(value);
    }

    fn exec_lea(&mut self, instr: u16) {
        let dr = extract(instr, 11, 3) as u8;
        let offset = sign_extend(extract(instr, 8, 9), 9);
        let addr = self.registers.pc.wrapping_add(offset);
        self.registers.set(dr, addr);
        self.registers.set_cc(addr);
    }

    fn exec_st(&mut self, instr: u16) -> Result<(), RuntimeError> {
        let sr = extract(instr, 11, 3) as u8;
        let offset = sign_extend(extract(instr, 8, 9), 9);
        let addr = self.registers.pc.wrapping_add(offset);
        self.memory.write(addr, self.registers.get(sr))
    }

    fn exec_sti(&mut self, instr: u16, keys: &mut dyn KeySource) -> Result<(), RuntimeError> {
        let sr = extract(instr, 11, 3) as u8;
        let offset = sign_extend(extract(instr, 8, 9), 9);
        let ptr_addr = self.registers.pc.wrapping_add(offset);
        let addr = self.memory.read(ptr_addr, keys);
        self.memory.write(addr, self.registers.get(sr))
    }

    fn exec_str(&mut self, instr: u16) -> Result<(), RuntimeError> {
        let sr = extract(instr, 11, 3) as u8;
        let base_r = extract(instr, 8, 3) as u8;
        let offset = sign_extend(extract(instr, 5, 6), 6);
        let addr = self.registers.get(base_r).wrapping_add(offset);
        self.memory.write(addr, self.registers.get(sr))
    }

    fn exec_trap(
        &mut self,
        instr: u16,
        keys: &mut dyn KeySource,
        out: &mut dyn Write,
    ) -> Result<(), RuntimeError> {
        self.registers.set(7, self.registers.pc);
        let vector = extract(instr, 7, 8);
        match vector {
            0x20 => self.trap_getc(keys)?,
            0x21 => self.trap_out(out)?,
            0x22 => self.trap_puts(out)?,
            0x23 => self.trap_in(keys, out)?,
            0x24 => self.trap_putsp(out)?,
            0x25 => self.trap_halt(out)?,
            _ => return Err(RuntimeError::IllegalInstruction { code: vector }),
        }
        Ok(())
    }

    fn trap_getc(&mut self, keys: &mut dyn KeySource) -> Result<(), RuntimeError> {
        let byte = keys.read_blocking().map_err(|e| RuntimeError::Io(e.to_string()))?;
        self.registers.set(0, byte as u16);
        self.registers.set_cc(byte as u16);
        Ok(())
    }

    fn trap_out(&mut self, out: &mut dyn Write) -> Result<(), RuntimeError> {
        let byte = (self.registers.get(0) & 0xFF) as u8;
        out.write_all(&[byte]).map_err(|e| RuntimeError::Io(e.to_string()))
    }

    fn trap_puts(&mut self, out: &mut dyn Write) -> Result<(), RuntimeError> {
        let mut addr = self.registers.get(0);
        loop {
            let word = self.memory.peek(addr);
            if word == 0 {
                break;
            }
            out.write_all(&[(word & 0xFF) as u8])
                .map_err(|e| RuntimeError::Io(e.to_string()))?;
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }

    fn trap_in(&mut self, keys: &mut dyn KeySource, out: &mut dyn Write) -> Result<(), RuntimeError> {
        out.write_all(b"Input a character> ")
            .map_err(|e| RuntimeError::Io(e.to_string()))?;
        out.flush().map_err(|e| RuntimeError::Io(e.to_string()))?;
        let byte = keys.read_blocking().map_err(|e| RuntimeError::Io(e.to_string()))?;
        out.write_all(&[byte]).map_err(|e| RuntimeError::Io(e.to_string()))?;
        self.registers.set(0, byte as u16);
        self.registers.set_cc(byte as u16);
        Ok(())
    }

    fn trap_halt(&mut self, out: &mut dyn Write) -> Result<(), RuntimeError> {
        out.write_all(b"\n\n--- halting the processor ---\n\n")
            .map_err(|e| RuntimeError::Io(e.to_string()))?;
        self.halted = true;
        Ok(())
    }

    /// Each memory word packs two 8-bit characters. Unlike a raw per-word
    /// emission, a zero high byte must not be printed.
    fn trap_putsp(&mut self, out: &mut dyn Write) -> Result<(), RuntimeError> {
        let mut addr = self.registers.get(0);
        loop {
            let word = self.memory.peek(addr);
            if word == 0 {
                break;
            }
            let low = (word & 0xFF) as u8;
            let high = (word >> 8) as u8;
            out.write_all(&[low]).map_err(|e| RuntimeError::Io(e.to_string()))?;
            if high != 0 {
                out.write_all(&[high]).map_err(|e| RuntimeError::Io(e.to_string()))?;
            }
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
