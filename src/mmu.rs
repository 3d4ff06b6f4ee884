//! Memory bus.
//!
//! Routes cartridge, video, timer, serial, joypad, and interrupt accesses to
//! their components. Everything else, work RAM and HRAM included, is backed
//! by one flat array; echo RAM is plain storage there, not a mirror.

use crate::cartridge::Cartridge;
use crate::input::Joypad;
use crate::interrupts::Interrupts;
use crate::ppu::Ppu;
use crate::serial::Serial;
use crate::timer::Timer;

const MEM_SIZE: usize = 0x10000;
const OAM_DMA_LEN: u16 = 0xA0;

pub struct Mmu {
    pub mem: [u8; MEM_SIZE],
    pub cart: Option<Cartridge>,
    pub ppu: Ppu,
    pub timer: Timer,
    pub serial: Serial,
    pub input: Joypad,
    pub interrupts: Interrupts,
}

impl Mmu {
    pub fn new() -> Self {
        Mmu {
            mem: [0; MEM_SIZE],
            cart: None,
            ppu: Ppu::new(),
            timer: Timer::new(),
            serial: Serial::new(),
            input: Joypad::new(),
            interrupts: Interrupts::new(),
        }
    }

    pub fn load_cart(&mut self, cart: Cartridge) {
        self.cart = Some(cart);
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => {
                self.cart.as_ref().map(|c| c.read_byte(addr)).unwrap_or(0xFF)
            }
            0x8000..=0x9FFF => self.ppu.read_vram(addr),
            0xFE00..=0xFE9F => self.ppu.read_oam(addr),
            0xFF00 => self.input.read(),
            0xFF01 | 0xFF02 => self.serial.read_reg(addr),
            0xFF04..=0xFF07 => self.timer.read_reg(addr),
            0xFF0F => self.interrupts.flagged(),
            0xFF40..=0xFF4B => self.ppu.read_reg(addr),
            0xFFFF => self.interrupts.enabled(),
            _ => self.mem[addr as usize],
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.write_byte(addr, val);
                } else {
                    log::warn!("cartridge write with nothing inserted: {addr:#06X}");
                }
            }
            0x8000..=0x9FFF => self.ppu.write_vram(addr, val),
            0xFE00..=0xFE9F => self.ppu.write_oam(addr, val),
            0xFF00 => self.input.write(val),
            0xFF01 | 0xFF02 => self.serial.write_reg(addr, val, &mut self.interrupts),
            0xFF04..=0xFF07 => self.timer.write_reg(addr, val),
            0xFF0F => self.interrupts.write_flagged(val),
            0xFF46 => {
                self.ppu.write_reg(addr, val);
                self.oam_dma(val);
            }
            0xFF40..=0xFF4B => self.ppu.write_reg(addr, val),
            0xFFFF => self.interrupts.write_enabled(val),
            _ => self.mem[addr as usize] = val,
        }
    }

    pub fn read_word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    pub fn write_word(&mut self, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write_byte(addr, lo);
        self.write_byte(addr.wrapping_add(1), hi);
    }

    pub fn push_stack(&mut self, sp: &mut u16, val: u16) {
        *sp = sp.wrapping_sub(2);
        self.write_word(*sp, val);
    }

    pub fn pop_stack(&mut self, sp: &mut u16) -> u16 {
        let val = self.read_word(*sp);
        *sp = sp.wrapping_add(2);
        val
    }

    /// Copies the whole 160-byte OAM block from `val << 8` in one shot.
    fn oam_dma(&mut self, val: u8) {
        let src = (val as u16) << 8;
        for i in 0..OAM_DMA_LEN {
            let byte = self.read_byte(src.wrapping_add(i));
            self.ppu.oam[i as usize] = byte;
        }
    }

    /// Runs the clocked components for the instruction that just executed.
    pub fn tick(&mut self, m_cycles: u32) {
        self.ppu.step(m_cycles, &mut self.interrupts);
        self.timer.tick(m_cycles, &mut self.interrupts);
    }

    pub fn take_serial(&mut self) -> Vec<u8> {
        self.serial.take_output()
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}
