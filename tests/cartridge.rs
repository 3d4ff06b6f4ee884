mod common;

use std::io::Write;
use std::path::Path;

use dotmatrix_core::cartridge::Cartridge;
use dotmatrix_core::mmu::Mmu;

#[test]
fn loads_a_plain_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.gb");
    std::fs::write(&path, common::build_rom(2, 0x00, 0x00)).unwrap();

    let cart = Cartridge::from_file(&path).unwrap();
    assert_eq!(cart.header.title, "DOTMTX");
    assert_eq!(cart.rom.len(), 0x8000);
}

#[test]
fn unzips_the_first_archive_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut archive = zip::ZipWriter::new(file);
    archive
        .start_file("blank.gb", zip::write::SimpleFileOptions::default())
        .unwrap();
    archive
        .write_all(&common::build_rom(2, 0x00, 0x00))
        .unwrap();
    archive.finish().unwrap();

    let cart = Cartridge::from_file(&path).unwrap();
    assert_eq!(cart.header.title, "DOTMTX");
    assert_eq!(cart.rom.len(), 0x8000);
}

#[test]
fn archive_without_files_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut archive = zip::ZipWriter::new(file);
    archive
        .add_directory("sub", zip::write::SimpleFileOptions::default())
        .unwrap();
    archive.finish().unwrap();

    let err = Cartridge::from_file(&path).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn missing_file_is_an_error() {
    let err = Cartridge::from_file(Path::new("no-such.gb")).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn mbc1_rom_bank_switching() {
    let mut rom = common::build_rom(64, 0x01, 0x00);
    for bank in 0..64 {
        rom[bank * 0x4000] = bank as u8;
    }
    let mut mmu = Mmu::new();
    mmu.cart = Some(Cartridge::from_bytes(rom).unwrap());

    // bank 0 never maps into the switchable window
    assert_eq!(mmu.read_byte(0x4000), 1);

    mmu.write_byte(0x2000, 0x02);
    assert_eq!(mmu.read_byte(0x4000), 2);

    mmu.write_byte(0x4000, 0x01); // upper bits select bank 0x22
    assert_eq!(mmu.read_byte(0x4000), 34);

    mmu.write_byte(0x6000, 0x01); // mode 1 rebanks the fixed area too
    assert_eq!(mmu.read_byte(0x0000), 32);
    mmu.write_byte(0x6000, 0x00);
    assert_eq!(mmu.read_byte(0x0000), 0);
}

#[test]
fn mbc1_bank_zero_writes_select_bank_one() {
    let mut rom = common::build_rom(4, 0x01, 0x00);
    for bank in 0..4 {
        rom[bank * 0x4000] = 0x10 + bank as u8;
    }
    let mut mmu = Mmu::new();
    mmu.cart = Some(Cartridge::from_bytes(rom).unwrap());

    mmu.write_byte(0x2000, 0x00);
    assert_eq!(mmu.read_byte(0x4000), 0x11);
    mmu.write_byte(0x2000, 0x02);
    mmu.write_byte(0x2000, 0x00); // rewrites keep snapping to 1
    assert_eq!(mmu.read_byte(0x4000), 0x11);
}

#[test]
fn mbc1_ram_gate_and_small_ram_wrap() {
    let rom = common::build_rom(2, 0x02, 0x01); // MBC1+RAM, 2 KiB
    let mut mmu = Mmu::new();
    mmu.cart = Some(Cartridge::from_bytes(rom).unwrap());

    mmu.write_byte(0xA000, 0x55); // gate closed
    assert_eq!(mmu.read_byte(0xA000), 0xFF);

    mmu.write_byte(0x0000, 0x0A);
    mmu.write_byte(0xA000, 0x55);
    assert_eq!(mmu.read_byte(0xA000), 0x55);
    assert_eq!(mmu.read_byte(0xA800), 0x55); // 2 KiB repeats across the window

    mmu.write_byte(0x0000, 0x00);
    assert_eq!(mmu.read_byte(0xA000), 0xFF);
}

#[test]
fn mbc1_32k_ram_banks_in_mode_one() {
    let rom = common::build_rom(2, 0x03, 0x03); // MBC1+RAM+Battery, 32 KiB
    let mut mmu = Mmu::new();
    mmu.cart = Some(Cartridge::from_bytes(rom).unwrap());
    mmu.write_byte(0x0000, 0x0A);

    mmu.write_byte(0xA000, 0x11);
    mmu.write_byte(0x4000, 0x02); // pick RAM bank 2
    assert_eq!(mmu.read_byte(0xA000), 0x11); // mode 0 stays on bank 0

    mmu.write_byte(0x6000, 0x01); // mode 1 applies the bank
    assert_eq!(mmu.read_byte(0xA000), 0x00);
    mmu.write_byte(0xA000, 0x22);

    mmu.write_byte(0x6000, 0x00);
    assert_eq!(mmu.read_byte(0xA000), 0x11);
}

#[test]
fn rom_reads_past_the_image_are_open_bus() {
    let mut rom = common::build_rom(4, 0x01, 0x00);
    rom.truncate(3 * 0x4000); // bank 3 is missing from the image
    let mut mmu = Mmu::new();
    mmu.cart = Some(Cartridge::from_bytes(rom).unwrap());

    mmu.write_byte(0x2000, 0x03);
    assert_eq!(mmu.read_byte(0x4000), 0xFF);
}
