mod common;

use dotmatrix_core::cartridge::Cartridge;
use dotmatrix_core::gameboy::GameBoy;
use dotmatrix_core::input::Button;

#[test]
fn reset_keeps_the_cartridge_but_rewinds_banking() {
    let mut rom = common::build_rom(4, 0x01, 0x00);
    for bank in 0..4 {
        rom[bank * 0x4000] = 0x30 + bank as u8;
    }
    let mut gb = GameBoy::new();
    gb.insert_cartridge(Cartridge::from_bytes(rom).unwrap());

    gb.mmu.write_byte(0x2000, 0x02);
    assert_eq!(gb.mmu.read_byte(0x4000), 0x32);
    gb.cpu.regs.pc = 0x1234;

    gb.reset();
    assert_eq!(gb.cpu.regs.pc, 0x0100);
    assert_eq!(gb.mmu.read_byte(0x4000), 0x31); // bank selection went back to 1
}

#[test]
fn buttons_flow_through_the_facade() {
    let mut gb = GameBoy::new();
    gb.mmu.write_byte(0xFF00, 0x10); // select action buttons
    gb.press_button(Button::A);
    assert_eq!(gb.mmu.read_byte(0xFF00) & 0x0F, 0x0E);
    gb.release_button(Button::A);
    assert_eq!(gb.mmu.read_byte(0xFF00) & 0x0F, 0x0F);
}

#[test]
fn frames_come_out_of_an_idle_loop() {
    let mut gb = common::boot_with_program(&[0x18, 0xFE]); // JR -2
    gb.mmu.write_byte(0xFF0F, 0x00);
    gb.run_frame();
    assert!(gb.frame_ready());
    assert_eq!(gb.mmu.read_byte(0xFF44), 144);
    assert_ne!(gb.mmu.read_byte(0xFF0F) & 0x01, 0);
    let _ = gb.take_frame();
    assert!(!gb.frame_ready());
}

#[test]
fn serial_output_drains_through_the_facade() {
    // two transfers back to back spell out a diagnostic message
    let mut gb = common::boot_with_program(&[
        0x3E, b'O', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, // LD A,'O'; LDH (SB),A; start
        0x3E, b'K', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, // LD A,'K'; LDH (SB),A; start
    ]);
    for _ in 0..8 {
        gb.step();
    }
    assert_eq!(gb.take_serial(), b"OK".to_vec());
    assert!(gb.take_serial().is_empty());
}
