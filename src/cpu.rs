//! LR35902 interpreter.
//!
//! `step` runs one unit of work: an interrupt dispatch, a halted/stopped
//! idle cycle, or a single instruction. It returns the m-cycle cost so the
//! orchestrator can advance the clocked components by the same amount.
//! Costs come from a static per-opcode table; taken branches add their
//! surcharge on top.

use crate::mmu::Mmu;
use crate::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Registers};

const INTERRUPT_DISPATCH_CYCLES: u32 = 5;

/// Opcodes the hardware decoder locks up on.
const ILLEGAL_OPCODES: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

/// Base m-cycle cost per unprefixed opcode, not-taken variants for
/// conditional control flow.
#[rustfmt::skip]
static OPCODE_CYCLES: [u32; 256] = [
    1, 3, 2, 2, 1, 1, 2, 1, 5, 2, 2, 2, 1, 1, 2, 1, // 0x00
    1, 3, 2, 2, 1, 1, 2, 1, 3, 2, 2, 2, 1, 1, 2, 1, // 0x10
    2, 3, 2, 2, 1, 1, 2, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 0x20
    2, 3, 2, 2, 3, 3, 3, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 0x30
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 0x40
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 0x50
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 0x60
    2, 2, 2, 2, 2, 2, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1, // 0x70
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 0x80
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 0x90
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 0xA0
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 0xB0
    2, 3, 3, 4, 3, 4, 2, 4, 2, 4, 3, 1, 3, 6, 2, 4, // 0xC0
    2, 3, 3, 1, 3, 4, 2, 4, 2, 4, 3, 1, 3, 1, 2, 4, // 0xD0
    3, 3, 2, 1, 1, 4, 2, 4, 4, 1, 4, 1, 1, 1, 2, 4, // 0xE0
    3, 3, 2, 1, 1, 4, 2, 4, 3, 2, 4, 1, 1, 1, 2, 4, // 0xF0
];

pub struct Cpu {
    pub regs: Registers,
    pub ime: bool,
    /// EI takes effect after the instruction that follows it.
    pending_ime: bool,
    pub halted: bool,
    pub stopped: bool,
    halt_bug: bool,
    pub cycles: u64,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            regs: Registers::new(),
            ime: false,
            pending_ime: false,
            halted: false,
            stopped: false,
            halt_bug: false,
            cycles: 0,
        }
    }

    /// Runs one unit of work and returns its m-cycle cost.
    pub fn step(&mut self, mmu: &mut Mmu) -> u32 {
        let cycles = self.execute_next(mmu);
        self.cycles += cycles as u64;
        cycles
    }

    fn execute_next(&mut self, mmu: &mut Mmu) -> u32 {
        let pending = mmu.interrupts.pending();

        if self.stopped {
            // Only a flagged joypad interrupt brings the clock back.
            if mmu.interrupts.flagged() & 0x10 != 0 {
                self.stopped = false;
            } else {
                return 1;
            }
        }

        if self.halted {
            if pending == 0 {
                return 1;
            }
            self.halted = false;
        }

        if self.ime && pending != 0 {
            return self.service_interrupt(mmu);
        }

        if self.pending_ime {
            self.ime = true;
            self.pending_ime = false;
        }

        #[cfg(feature = "cpu-trace")]
        let fetch_pc = self.regs.pc;

        let opcode = if self.halt_bug {
            // The fetch that skipped the pc increment: this byte runs twice.
            self.halt_bug = false;
            mmu.read_byte(self.regs.pc)
        } else {
            self.fetch8(mmu)
        };

        #[cfg(feature = "cpu-trace")]
        log::trace!(
            "{fetch_pc:04X}: {opcode:02X} AF={:04X} BC={:04X} DE={:04X} HL={:04X} SP={:04X}",
            self.regs.af(),
            self.regs.bc(),
            self.regs.de(),
            self.regs.hl(),
            self.regs.sp,
        );

        self.execute(opcode, mmu)
    }

    /// Dispatches the lowest pending interrupt. Instruction execution
    /// resumes on the next call.
    fn service_interrupt(&mut self, mmu: &mut Mmu) -> u32 {
        let Some(int) = mmu.interrupts.next_pending() else {
            return 0;
        };
        mmu.interrupts.clear(int);
        self.ime = false;
        mmu.push_stack(&mut self.regs.sp, self.regs.pc);
        self.regs.pc = int.vector();
        #[cfg(feature = "cpu-trace")]
        log::trace!("dispatching {int:?} to {:#06X}", self.regs.pc);
        INTERRUPT_DISPATCH_CYCLES
    }

    #[inline(always)]
    fn fetch8(&mut self, mmu: &Mmu) -> u8 {
        let val = mmu.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        val
    }

    #[inline(always)]
    fn fetch16(&mut self, mmu: &Mmu) -> u16 {
        let lo = self.fetch8(mmu) as u16;
        let hi = self.fetch8(mmu) as u16;
        (hi << 8) | lo
    }

    fn read_reg(&self, mmu: &Mmu, index: u8) -> u8 {
        match index {
            0 => self.regs.b(),
            1 => self.regs.c(),
            2 => self.regs.d(),
            3 => self.regs.e(),
            4 => self.regs.h(),
            5 => self.regs.l(),
            6 => mmu.read_byte(self.regs.hl()),
            7 => self.regs.a(),
            _ => unreachable!(),
        }
    }

    fn write_reg(&mut self, mmu: &mut Mmu, index: u8, val: u8) {
        match index {
            0 => self.regs.set_b(val),
            1 => self.regs.set_c(val),
            2 => self.regs.set_d(val),
            3 => self.regs.set_e(val),
            4 => self.regs.set_h(val),
            5 => self.regs.set_l(val),
            6 => mmu.write_byte(self.regs.hl(), val),
            7 => self.regs.set_a(val),
            _ => unreachable!(),
        }
    }

    fn read_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    fn write_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.regs.set_bc(val),
            1 => self.regs.set_de(val),
            2 => self.regs.set_hl(val),
            _ => self.regs.sp = val,
        }
    }

    /// NZ, Z, NC, C in encoding order.
    fn condition(&self, index: u8) -> bool {
        match index {
            0 => !self.regs.flag(FLAG_Z),
            1 => self.regs.flag(FLAG_Z),
            2 => !self.regs.flag(FLAG_C),
            _ => self.regs.flag(FLAG_C),
        }
    }

    fn execute(&mut self, opcode: u8, mmu: &mut Mmu) -> u32 {
        let mut cycles = OPCODE_CYCLES[opcode as usize];
        match opcode {
            0x00 => {}
            // 16-bit loads and arithmetic, pair index in bits 4-5
            0x01 | 0x11 | 0x21 | 0x31 => {
                let val = self.fetch16(mmu);
                self.write_rp(opcode >> 4 & 0x03, val);
            }
            0x03 | 0x13 | 0x23 | 0x33 => {
                let rp = opcode >> 4 & 0x03;
                let val = self.read_rp(rp).wrapping_add(1);
                self.write_rp(rp, val);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let rp = opcode >> 4 & 0x03;
                let val = self.read_rp(rp).wrapping_sub(1);
                self.write_rp(rp, val);
            }
            0x09 | 0x19 | 0x29 | 0x39 => {
                let val = self.read_rp(opcode >> 4 & 0x03);
                self.add16(val);
            }
            // INC r / DEC r / LD r, d8, register index in bits 3-5
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = opcode >> 3 & 0x07;
                let val = self.read_reg(mmu, r);
                let res = val.wrapping_add(1);
                self.regs.set_f(
                    (self.regs.f() & FLAG_C)
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if val & 0x0F == 0x0F { FLAG_H } else { 0 },
                );
                self.write_reg(mmu, r, res);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let r = opcode >> 3 & 0x07;
                let val = self.read_reg(mmu, r);
                let res = val.wrapping_sub(1);
                self.regs.set_f(
                    (self.regs.f() & FLAG_C)
                        | FLAG_N
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if val & 0x0F == 0 { FLAG_H } else { 0 },
                );
                self.write_reg(mmu, r, res);
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let val = self.fetch8(mmu);
                self.write_reg(mmu, opcode >> 3 & 0x07, val);
            }
            // accumulator loads through BC/DE/HL±
            0x02 => mmu.write_byte(self.regs.bc(), self.regs.a()),
            0x12 => mmu.write_byte(self.regs.de(), self.regs.a()),
            0x0A => {
                let val = mmu.read_byte(self.regs.bc());
                self.regs.set_a(val);
            }
            0x1A => {
                let val = mmu.read_byte(self.regs.de());
                self.regs.set_a(val);
            }
            0x22 => {
                let hl = self.regs.hl();
                mmu.write_byte(hl, self.regs.a());
                self.regs.set_hl(hl.wrapping_add(1));
            }
            0x2A => {
                let hl = self.regs.hl();
                let val = mmu.read_byte(hl);
                self.regs.set_a(val);
                self.regs.set_hl(hl.wrapping_add(1));
            }
            0x32 => {
                let hl = self.regs.hl();
                mmu.write_byte(hl, self.regs.a());
                self.regs.set_hl(hl.wrapping_sub(1));
            }
            0x3A => {
                let hl = self.regs.hl();
                let val = mmu.read_byte(hl);
                self.regs.set_a(val);
                self.regs.set_hl(hl.wrapping_sub(1));
            }
            0x08 => {
                let addr = self.fetch16(mmu);
                mmu.write_word(addr, self.regs.sp);
            }
            // accumulator rotates always clear Z
            0x07 => {
                let a = self.regs.a();
                self.regs.set_a(a.rotate_left(1));
                self.regs.set_f(if a & 0x80 != 0 { FLAG_C } else { 0 });
            }
            0x0F => {
                let a = self.regs.a();
                self.regs.set_a(a.rotate_right(1));
                self.regs.set_f(if a & 0x01 != 0 { FLAG_C } else { 0 });
            }
            0x17 => {
                let a = self.regs.a();
                self.regs.set_a((a << 1) | self.regs.flag(FLAG_C) as u8);
                self.regs.set_f(if a & 0x80 != 0 { FLAG_C } else { 0 });
            }
            0x1F => {
                let a = self.regs.a();
                self.regs.set_a((a >> 1) | (self.regs.flag(FLAG_C) as u8) << 7);
                self.regs.set_f(if a & 0x01 != 0 { FLAG_C } else { 0 });
            }
            0x10 => {
                // STOP: the pad byte is consumed and the clock stands still.
                let _ = self.fetch8(mmu);
                mmu.timer.reset_div();
                self.stopped = true;
            }
            // relative jumps
            0x18 => {
                let offset = self.fetch8(mmu) as i8;
                self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.fetch8(mmu) as i8;
                if self.condition(opcode >> 3 & 0x03) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    cycles += 1;
                }
            }
            0x27 => self.daa(),
            0x2F => {
                self.regs.set_a(!self.regs.a());
                self.regs
                    .set_f((self.regs.f() & (FLAG_Z | FLAG_C)) | FLAG_N | FLAG_H);
            }
            0x37 => self.regs.set_f((self.regs.f() & FLAG_Z) | FLAG_C),
            0x3F => {
                let carry = !self.regs.flag(FLAG_C);
                self.regs
                    .set_f((self.regs.f() & FLAG_Z) | if carry { FLAG_C } else { 0 });
            }
            // the LD quadrant; 0x76 is HALT, handled below
            0x40..=0x7F if opcode != 0x76 => {
                let val = self.read_reg(mmu, opcode & 0x07);
                self.write_reg(mmu, opcode >> 3 & 0x07, val);
            }
            0x76 => {
                if self.ime || mmu.interrupts.pending() == 0 {
                    self.halted = true;
                } else {
                    self.halt_bug = true;
                }
            }
            // the ALU quadrant, operation in bits 3-5
            0x80..=0xBF => {
                let val = self.read_reg(mmu, opcode & 0x07);
                match opcode >> 3 & 0x07 {
                    0 => self.alu_add(val),
                    1 => self.alu_adc(val),
                    2 => self.alu_sub(val),
                    3 => self.alu_sbc(val),
                    4 => self.alu_and(val),
                    5 => self.alu_xor(val),
                    6 => self.alu_or(val),
                    _ => self.alu_cp(val),
                }
            }
            0xC6 => {
                let val = self.fetch8(mmu);
                self.alu_add(val);
            }
            0xCE => {
                let val = self.fetch8(mmu);
                self.alu_adc(val);
            }
            0xD6 => {
                let val = self.fetch8(mmu);
                self.alu_sub(val);
            }
            0xDE => {
                let val = self.fetch8(mmu);
                self.alu_sbc(val);
            }
            0xE6 => {
                let val = self.fetch8(mmu);
                self.alu_and(val);
            }
            0xEE => {
                let val = self.fetch8(mmu);
                self.alu_xor(val);
            }
            0xF6 => {
                let val = self.fetch8(mmu);
                self.alu_or(val);
            }
            0xFE => {
                let val = self.fetch8(mmu);
                self.alu_cp(val);
            }
            // returns
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                if self.condition(opcode >> 3 & 0x03) {
                    self.regs.pc = mmu.pop_stack(&mut self.regs.sp);
                    cycles += 3;
                }
            }
            0xC9 => self.regs.pc = mmu.pop_stack(&mut self.regs.sp),
            0xD9 => {
                self.regs.pc = mmu.pop_stack(&mut self.regs.sp);
                self.ime = true;
            }
            // stack push/pop, pair index in bits 4-5 with AF in slot 3
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let val = mmu.pop_stack(&mut self.regs.sp);
                match opcode >> 4 & 0x03 {
                    0 => self.regs.set_bc(val),
                    1 => self.regs.set_de(val),
                    2 => self.regs.set_hl(val),
                    _ => self.regs.set_af(val),
                }
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let val = match opcode >> 4 & 0x03 {
                    0 => self.regs.bc(),
                    1 => self.regs.de(),
                    2 => self.regs.hl(),
                    _ => self.regs.af(),
                };
                mmu.push_stack(&mut self.regs.sp, val);
            }
            // absolute jumps and calls
            0xC3 => self.regs.pc = self.fetch16(mmu),
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let addr = self.fetch16(mmu);
                if self.condition(opcode >> 3 & 0x03) {
                    self.regs.pc = addr;
                    cycles += 1;
                }
            }
            0xCD => {
                let addr = self.fetch16(mmu);
                mmu.push_stack(&mut self.regs.sp, self.regs.pc);
                self.regs.pc = addr;
            }
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let addr = self.fetch16(mmu);
                if self.condition(opcode >> 3 & 0x03) {
                    mmu.push_stack(&mut self.regs.sp, self.regs.pc);
                    self.regs.pc = addr;
                    cycles += 3;
                }
            }
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                mmu.push_stack(&mut self.regs.sp, self.regs.pc);
                self.regs.pc = (opcode & 0x38) as u16;
            }
            0xE9 => self.regs.pc = self.regs.hl(),
            0xCB => {
                let op = self.fetch8(mmu);
                cycles = self.handle_cb(op, mmu);
            }
            // high-page and absolute accumulator loads
            0xE0 => {
                let offset = self.fetch8(mmu);
                mmu.write_byte(0xFF00 | offset as u16, self.regs.a());
            }
            0xF0 => {
                let offset = self.fetch8(mmu);
                let val = mmu.read_byte(0xFF00 | offset as u16);
                self.regs.set_a(val);
            }
            0xE2 => mmu.write_byte(0xFF00 | self.regs.c() as u16, self.regs.a()),
            0xF2 => {
                let val = mmu.read_byte(0xFF00 | self.regs.c() as u16);
                self.regs.set_a(val);
            }
            0xEA => {
                let addr = self.fetch16(mmu);
                mmu.write_byte(addr, self.regs.a());
            }
            0xFA => {
                let addr = self.fetch16(mmu);
                let val = mmu.read_byte(addr);
                self.regs.set_a(val);
            }
            // stack pointer arithmetic; flags come from the low byte adds
            0xE8 => {
                let offset = self.fetch8(mmu) as i8 as i16 as u16;
                let sp = self.regs.sp;
                self.regs.set_f(
                    if (sp & 0x0F) + (offset & 0x0F) > 0x0F { FLAG_H } else { 0 }
                        | if (sp & 0xFF) + (offset & 0xFF) > 0xFF { FLAG_C } else { 0 },
                );
                self.regs.sp = sp.wrapping_add(offset);
            }
            0xF8 => {
                let offset = self.fetch8(mmu) as i8 as i16 as u16;
                let sp = self.regs.sp;
                self.regs.set_f(
                    if (sp & 0x0F) + (offset & 0x0F) > 0x0F { FLAG_H } else { 0 }
                        | if (sp & 0xFF) + (offset & 0xFF) > 0xFF { FLAG_C } else { 0 },
                );
                self.regs.set_hl(sp.wrapping_add(offset));
            }
            0xF9 => self.regs.sp = self.regs.hl(),
            0xF3 => {
                self.ime = false;
                self.pending_ime = false;
            }
            0xFB => self.pending_ime = true,
            _ => {
                if ILLEGAL_OPCODES.contains(&opcode) {
                    log::error!(
                        "illegal opcode {opcode:#04X} at {:#06X}",
                        self.regs.pc.wrapping_sub(1)
                    );
                } else {
                    log::warn!("opcode {opcode:#04X} not handled, running as a no-op");
                }
            }
        }
        cycles
    }

    fn handle_cb(&mut self, opcode: u8, mmu: &mut Mmu) -> u32 {
        let r = opcode & 0x07;
        match opcode {
            0x00..=0x07 => {
                let val = self.read_reg(mmu, r);
                let res = val.rotate_left(1);
                self.write_reg(mmu, r, res);
                self.regs.set_f(
                    if res == 0 { FLAG_Z } else { 0 } | if val & 0x80 != 0 { FLAG_C } else { 0 },
                );
            }
            0x08..=0x0F => {
                let val = self.read_reg(mmu, r);
                let res = val.rotate_right(1);
                self.write_reg(mmu, r, res);
                self.regs.set_f(
                    if res == 0 { FLAG_Z } else { 0 } | if val & 0x01 != 0 { FLAG_C } else { 0 },
                );
            }
            0x10..=0x17 => {
                let val = self.read_reg(mmu, r);
                let res = (val << 1) | self.regs.flag(FLAG_C) as u8;
                self.write_reg(mmu, r, res);
                self.regs.set_f(
                    if res == 0 { FLAG_Z } else { 0 } | if val & 0x80 != 0 { FLAG_C } else { 0 },
                );
            }
            0x18..=0x1F => {
                let val = self.read_reg(mmu, r);
                let res = (val >> 1) | (self.regs.flag(FLAG_C) as u8) << 7;
                self.write_reg(mmu, r, res);
                self.regs.set_f(
                    if res == 0 { FLAG_Z } else { 0 } | if val & 0x01 != 0 { FLAG_C } else { 0 },
                );
            }
            0x20..=0x27 => {
                let val = self.read_reg(mmu, r);
                let res = val << 1;
                self.write_reg(mmu, r, res);
                self.regs.set_f(
                    if res == 0 { FLAG_Z } else { 0 } | if val & 0x80 != 0 { FLAG_C } else { 0 },
                );
            }
            0x28..=0x2F => {
                let val = self.read_reg(mmu, r);
                let res = (val >> 1) | (val & 0x80);
                self.write_reg(mmu, r, res);
                self.regs.set_f(
                    if res == 0 { FLAG_Z } else { 0 } | if val & 0x01 != 0 { FLAG_C } else { 0 },
                );
            }
            0x30..=0x37 => {
                let val = self.read_reg(mmu, r);
                let res = val.rotate_left(4);
                self.write_reg(mmu, r, res);
                self.regs.set_f(if res == 0 { FLAG_Z } else { 0 });
            }
            0x38..=0x3F => {
                let val = self.read_reg(mmu, r);
                let res = val >> 1;
                self.write_reg(mmu, r, res);
                self.regs.set_f(
                    if res == 0 { FLAG_Z } else { 0 } | if val & 0x01 != 0 { FLAG_C } else { 0 },
                );
            }
            0x40..=0x7F => {
                let bit = (opcode - 0x40) >> 3;
                let val = self.read_reg(mmu, r);
                self.regs.set_f(
                    (self.regs.f() & FLAG_C)
                        | FLAG_H
                        | if val & (1 << bit) == 0 { FLAG_Z } else { 0 },
                );
                // BIT only reads memory, so (HL) costs one cycle less.
                return if r == 6 { 3 } else { 2 };
            }
            0x80..=0xBF => {
                let bit = (opcode - 0x80) >> 3;
                let val = self.read_reg(mmu, r) & !(1 << bit);
                self.write_reg(mmu, r, val);
            }
            0xC0..=0xFF => {
                let bit = (opcode - 0xC0) >> 3;
                let val = self.read_reg(mmu, r) | 1 << bit;
                self.write_reg(mmu, r, val);
            }
        }
        if r == 6 { 4 } else { 2 }
    }

    fn daa(&mut self) {
        let a = self.regs.a();
        let mut correction = 0u8;
        let mut carry = false;
        if self.regs.flag(FLAG_H) || (!self.regs.flag(FLAG_N) && a & 0x0F > 9) {
            correction |= 0x06;
        }
        if self.regs.flag(FLAG_C) || (!self.regs.flag(FLAG_N) && a > 0x99) {
            correction |= 0x60;
            carry = true;
        }
        let res = if self.regs.flag(FLAG_N) {
            a.wrapping_sub(correction)
        } else {
            a.wrapping_add(correction)
        };
        self.regs.set_a(res);
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 }
                | (self.regs.f() & FLAG_N)
                | if carry { FLAG_C } else { 0 },
        );
    }

    fn add16(&mut self, val: u16) {
        let hl = self.regs.hl();
        let res = hl.wrapping_add(val);
        self.regs.set_f(
            (self.regs.f() & FLAG_Z)
                | if (hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF { FLAG_H } else { 0 }
                | if hl as u32 + val as u32 > 0xFFFF { FLAG_C } else { 0 },
        );
        self.regs.set_hl(res);
    }

    fn alu_add(&mut self, val: u8) {
        let a = self.regs.a();
        let (res, carry) = a.overflowing_add(val);
        self.regs.set_f(
            if res == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) + (val & 0x0F) > 0x0F { FLAG_H } else { 0 }
                | if carry { FLAG_C } else { 0 },
        );
        self.regs.set_a(res);
    }

    fn alu_adc(&mut self, val: u8) {
        let a = self.regs.a();
        let carry_in = self.regs.flag(FLAG_C) as u8;
        let (res1, carry1) = a.overflowing_add(val);
        let (res2, carry2) = res1.overflowing_add(carry_in);
        self.regs.set_f(
            if res2 == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) + (val & 0x0F) + carry_in > 0x0F { FLAG_H } else { 0 }
                | if carry1 || carry2 { FLAG_C } else { 0 },
        );
        self.regs.set_a(res2);
    }

    fn alu_sub(&mut self, val: u8) {
        let a = self.regs.a();
        let (res, borrow) = a.overflowing_sub(val);
        self.regs.set_f(
            FLAG_N
                | if res == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) < (val & 0x0F) { FLAG_H } else { 0 }
                | if borrow { FLAG_C } else { 0 },
        );
        self.regs.set_a(res);
    }

    fn alu_sbc(&mut self, val: u8) {
        let a = self.regs.a();
        let carry_in = self.regs.flag(FLAG_C) as u8;
        let (res1, borrow1) = a.overflowing_sub(val);
        let (res2, borrow2) = res1.overflowing_sub(carry_in);
        self.regs.set_f(
            FLAG_N
                | if res2 == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) < (val & 0x0F) + carry_in { FLAG_H } else { 0 }
                | if borrow1 || borrow2 { FLAG_C } else { 0 },
        );
        self.regs.set_a(res2);
    }

    fn alu_and(&mut self, val: u8) {
        let res = self.regs.a() & val;
        self.regs.set_a(res);
        self.regs
            .set_f(if res == 0 { FLAG_Z } else { 0 } | FLAG_H);
    }

    fn alu_xor(&mut self, val: u8) {
        let res = self.regs.a() ^ val;
        self.regs.set_a(res);
        self.regs.set_f(if res == 0 { FLAG_Z } else { 0 });
    }

    fn alu_or(&mut self, val: u8) {
        let res = self.regs.a() | val;
        self.regs.set_a(res);
        self.regs.set_f(if res == 0 { FLAG_Z } else { 0 });
    }

    fn alu_cp(&mut self, val: u8) {
        let a = self.regs.a();
        let res = a.wrapping_sub(val);
        self.regs.set_f(
            FLAG_N
                | if res == 0 { FLAG_Z } else { 0 }
                | if (a & 0x0F) < (val & 0x0F) { FLAG_H } else { 0 }
                | if a < val { FLAG_C } else { 0 },
        );
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
