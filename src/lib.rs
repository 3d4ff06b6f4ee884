//! DMG Game Boy emulation core.
//!
//! This crate contains the platform-agnostic emulator logic (CPU/MMU/PPU/etc).
//! Frontends drive the machine through the [`gameboy`] facade: insert a
//! cartridge, call `step` or `run_frame`, and read back the finished
//! viewport and serial output.

/// Cartridge header parsing, mappers, and ROM/RAM banking.
pub mod cartridge;

/// LR35902 CPU core.
pub mod cpu;

/// High-level facade that wires the CPU and MMU into a single machine.
pub mod gameboy;

/// Joypad input register and button state.
pub mod input;

/// Interrupt enable/flag registers and dispatch order.
pub mod interrupts;

/// Memory map and hardware plumbing.
pub mod mmu;

/// Pixel Processing Unit (PPU) emulation.
pub mod ppu;

/// CPU register file and flag helpers.
pub mod registers;

/// Serial port with a capturing output buffer.
pub mod serial;

/// Divider/timer unit.
pub mod timer;
