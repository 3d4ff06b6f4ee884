#![allow(dead_code)]

use dotmatrix_core::gameboy::GameBoy;

/// Builds a blank ROM image of `bank_count` 16 KiB banks with a valid header.
pub fn build_rom(bank_count: usize, cart_type: u8, ram_size_code: u8) -> Vec<u8> {
    let mut rom = vec![0u8; bank_count * 0x4000];
    rom[0x134..0x13A].copy_from_slice(b"DOTMTX");
    rom[0x147] = cart_type;
    rom[0x148] = rom_size_code(bank_count);
    rom[0x149] = ram_size_code;
    fix_header_checksum(&mut rom);
    rom
}

fn rom_size_code(bank_count: usize) -> u8 {
    match bank_count {
        0..=2 => 0x00,
        3..=4 => 0x01,
        5..=8 => 0x02,
        9..=16 => 0x03,
        17..=32 => 0x04,
        33..=64 => 0x05,
        65..=128 => 0x06,
        _ => 0x07,
    }
}

/// Recomputes the header checksum so loading stays quiet.
pub fn fix_header_checksum(rom: &mut [u8]) {
    let checksum = rom[0x134..=0x14C]
        .iter()
        .fold(0u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1));
    rom[0x14D] = checksum;
}

/// Boots a bare machine with `program` copied into work RAM and the
/// program counter parked on its first byte.
pub fn boot_with_program(program: &[u8]) -> GameBoy {
    let mut gb = GameBoy::new();
    for (i, &byte) in program.iter().enumerate() {
        gb.mmu.write_byte(0xC000 + i as u16, byte);
    }
    gb.cpu.regs.pc = 0xC000;
    gb
}
