//! LR35902 register file.
//!
//! The 8-bit registers pair up into AF/BC/DE/HL and most 16-bit work happens
//! on the pairs, so each pair is stored as one `u16` and the 8-bit halves are
//! views onto it. The low nibble of F does not physically exist; every write
//! path masks it to zero.

pub const FLAG_Z: u8 = 0x80; // zero
pub const FLAG_N: u8 = 0x40; // subtraction
pub const FLAG_H: u8 = 0x20; // half-carry
pub const FLAG_C: u8 = 0x10; // carry

#[derive(Clone, Copy, Debug)]
pub struct Registers {
    af: u16,
    bc: u16,
    de: u16,
    hl: u16,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// Post-boot DMG values; execution starts at the cartridge entry point.
    pub fn new() -> Self {
        Self {
            af: 0x0180,
            bc: 0x0013,
            de: 0x00D8,
            hl: 0x014D,
            sp: 0xFFFE,
            pc: 0x0100,
        }
    }

    pub fn a(&self) -> u8 {
        (self.af >> 8) as u8
    }

    pub fn f(&self) -> u8 {
        (self.af & 0x00F0) as u8
    }

    pub fn b(&self) -> u8 {
        (self.bc >> 8) as u8
    }

    pub fn c(&self) -> u8 {
        (self.bc & 0x00FF) as u8
    }

    pub fn d(&self) -> u8 {
        (self.de >> 8) as u8
    }

    pub fn e(&self) -> u8 {
        (self.de & 0x00FF) as u8
    }

    pub fn h(&self) -> u8 {
        (self.hl >> 8) as u8
    }

    pub fn l(&self) -> u8 {
        (self.hl & 0x00FF) as u8
    }

    pub fn set_a(&mut self, val: u8) {
        self.af = (self.af & 0x00F0) | ((val as u16) << 8);
    }

    pub fn set_f(&mut self, val: u8) {
        self.af = (self.af & 0xFF00) | (val & 0xF0) as u16;
    }

    pub fn set_b(&mut self, val: u8) {
        self.bc = (self.bc & 0x00FF) | ((val as u16) << 8);
    }

    pub fn set_c(&mut self, val: u8) {
        self.bc = (self.bc & 0xFF00) | val as u16;
    }

    pub fn set_d(&mut self, val: u8) {
        self.de = (self.de & 0x00FF) | ((val as u16) << 8);
    }

    pub fn set_e(&mut self, val: u8) {
        self.de = (self.de & 0xFF00) | val as u16;
    }

    pub fn set_h(&mut self, val: u8) {
        self.hl = (self.hl & 0x00FF) | ((val as u16) << 8);
    }

    pub fn set_l(&mut self, val: u8) {
        self.hl = (self.hl & 0xFF00) | val as u16;
    }

    pub fn af(&self) -> u16 {
        self.af
    }

    pub fn bc(&self) -> u16 {
        self.bc
    }

    pub fn de(&self) -> u16 {
        self.de
    }

    pub fn hl(&self) -> u16 {
        self.hl
    }

    pub fn set_af(&mut self, val: u16) {
        self.af = val & 0xFFF0;
    }

    pub fn set_bc(&mut self, val: u16) {
        self.bc = val;
    }

    pub fn set_de(&mut self, val: u16) {
        self.de = val;
    }

    pub fn set_hl(&mut self, val: u16) {
        self.hl = val;
    }

    pub fn flag(&self, mask: u8) -> bool {
        self.f() & mask != 0
    }

    pub fn set_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.set_f(self.f() | mask);
        } else {
            self.set_f(self.f() & !mask);
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
