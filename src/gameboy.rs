//! Top-level console facade tying the CPU to the bus.

use std::io;
use std::path::Path;

use crate::cartridge::Cartridge;
use crate::cpu::Cpu;
use crate::input::Button;
use crate::mmu::Mmu;
use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
}

impl GameBoy {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            mmu: Mmu::new(),
        }
    }

    /// Loads a cartridge image from disk and inserts it.
    pub fn load_rom<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        let cart = Cartridge::from_file(path.as_ref())?;
        self.insert_cartridge(cart);
        Ok(())
    }

    pub fn insert_cartridge(&mut self, cart: Cartridge) {
        self.mmu.load_cart(cart);
    }

    /// Resets to power-on state while preserving the inserted cartridge.
    /// The cartridge keeps its RAM but its banking registers start over.
    pub fn reset(&mut self) {
        let cart = self.mmu.cart.take();
        *self = Self::new();
        if let Some(mut cart) = cart {
            cart.reset();
            self.mmu.load_cart(cart);
        }
    }

    /// Runs one CPU step and advances the clocked components by its cost.
    /// Returns the m-cycles consumed.
    pub fn step(&mut self) -> u32 {
        let cycles = self.cpu.step(&mut self.mmu);
        self.mmu.tick(cycles);
        cycles
    }

    /// Steps until the next frame is complete, then leaves it pending.
    pub fn run_frame(&mut self) {
        while !self.mmu.ppu.frame_ready() {
            self.step();
        }
    }

    pub fn frame_ready(&self) -> bool {
        self.mmu.ppu.frame_ready()
    }

    /// Hands out the finished frame and clears the pending flag.
    pub fn take_frame(&mut self) -> &[[u8; SCREEN_WIDTH]; SCREEN_HEIGHT] {
        self.mmu.ppu.clear_frame_flag();
        self.mmu.ppu.viewport()
    }

    pub fn press_button(&mut self, button: Button) {
        self.mmu.input.press(button, &mut self.mmu.interrupts);
    }

    pub fn release_button(&mut self, button: Button) {
        self.mmu.input.release(button);
    }

    /// Drains whatever the serial port has shifted out so far.
    pub fn take_serial(&mut self) -> Vec<u8> {
        self.mmu.serial.take_output()
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}
