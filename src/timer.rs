//! Divider and timer unit (DIV/TIMA/TMA/TAC).
//!
//! One 20-bit machine-cycle counter backs everything: DIV is bits 6..14, and
//! TIMA advances whenever the counter crosses a multiple of the period picked
//! by TAC's low two bits. Tick counts are taken from the pre-wrap counter so
//! a wrap at 2^20 never produces phantom increments (every period divides
//! 2^20, so the phase stays aligned across the wrap).

use crate::interrupts::{Interrupt, Interrupts};

const COUNTER_WRAP: u32 = 1 << 20;

// Machine-cycle period per TAC clock select, expressed as a counter shift:
// 4096 Hz, 262144 Hz, 65536 Hz, 16384 Hz.
const TAC_SHIFTS: [u32; 4] = [8, 2, 4, 6];

pub struct Timer {
    counter: u32,
    div: u8,
    tima: u8,
    tma: u8,
    tac: u8,
}

impl Timer {
    pub fn new() -> Self {
        let div: u8 = 0xAB;
        Self {
            counter: (div as u32) << 6,
            div,
            tima: 0x00,
            tma: 0x00,
            tac: 0xF8,
        }
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => self.div,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac,
            _ => 0xFF,
        }
    }

    pub fn write_reg(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF04 => self.reset_div(),
            0xFF05 => self.tima = val,
            0xFF06 => self.tma = val,
            0xFF07 => self.tac = 0xF8 | (val & 0x07),
            _ => {}
        }
    }

    /// Any DIV write zeroes the whole backing counter, TIMA phase included.
    pub fn reset_div(&mut self) {
        self.counter = 0;
        self.div = 0;
    }

    pub fn tick(&mut self, cycles: u32, ints: &mut Interrupts) {
        let prev = self.counter;
        let next = prev + cycles;
        self.counter = next % COUNTER_WRAP;
        self.div = (self.counter >> 6) as u8;

        if self.tac & 0x04 == 0 {
            return;
        }

        let shift = TAC_SHIFTS[(self.tac & 0x03) as usize];
        let ticks = (next >> shift) - (prev >> shift);
        if ticks == 0 {
            return;
        }

        let updated = self.tima as u32 + ticks;
        if updated > 0xFF {
            self.tima = self.tma.wrapping_add((updated >> 8) as u8);
            ints.set(Interrupt::Timer);
        } else {
            self.tima = updated as u8;
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
