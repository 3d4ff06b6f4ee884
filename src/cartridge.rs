//! Cartridge image, header metadata, and bank controllers.
//!
//! Only the two board families the core supports are modeled: plain ROM
//! boards (optionally with RAM) and MBC1. The header tables follow the
//! published cartridge database; lookups that fall outside them fail the
//! load rather than guessing.

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::Path;

const ROM_BANK_SIZE: usize = 0x4000;
const RAM_BANK_SIZE: usize = 0x2000;
const HEADER_END: usize = 0x150;

/// Parsed cartridge header (0x100-0x14F).
#[derive(Clone, Debug)]
pub struct Header {
    pub title: String,
    pub manufacturer: String,
    pub licensee: &'static str,
    pub cgb: bool,
    pub sgb: bool,
    pub cart_type: u8,
    pub type_name: &'static str,
    pub rom_size: usize,
    pub ram_size: usize,
    pub destination: &'static str,
    pub version: u8,
    pub checksum: u8,
    pub global_checksum: u16,
}

impl Header {
    pub fn parse(data: &[u8]) -> io::Result<Header> {
        if data.len() < HEADER_END {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "image too short to hold a cartridge header",
            ));
        }

        let cart_type = data[0x147];
        let type_name = cartridge_type_name(cart_type).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown cartridge type {cart_type:#04X}"),
            )
        })?;
        let rom_size = rom_size_bytes(data[0x148]).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown ROM size code {:#04X}", data[0x148]),
            )
        })?;
        let ram_size = ram_size_bytes(data[0x149]).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown RAM size code {:#04X}", data[0x149]),
            )
        })?;

        let licensee = if data[0x14B] == 0x33 {
            let code = [data[0x144], data[0x145]];
            new_licensee_name(&code)
        } else {
            old_licensee_name(data[0x14B])
        };

        Ok(Header {
            title: ascii_field(&data[0x134..0x143]),
            manufacturer: ascii_field(&data[0x13F..0x142]),
            licensee,
            cgb: data[0x143] == 0x80,
            sgb: data[0x146] == 0x03,
            cart_type,
            type_name,
            rom_size,
            ram_size,
            destination: match data[0x14A] {
                0x00 => "Japan",
                0x01 => "Overseas only",
                _ => "Unknown",
            },
            version: data[0x14C],
            checksum: data[0x14D],
            global_checksum: u16::from_be_bytes([data[0x14E], data[0x14F]]),
        })
    }

    /// Checksum over 0x134-0x14C as the boot ROM computes it.
    pub fn computed_checksum(data: &[u8]) -> u8 {
        data[0x134..=0x14C]
            .iter()
            .fold(0u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1))
    }
}

fn ascii_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[derive(Debug)]
enum Mbc {
    None,
    Mbc1 {
        rom_bank: u8,
        ram_bank: u8,
        banking_mode: u8,
        ram_enabled: bool,
    },
}

impl Mbc {
    fn for_type(cart_type: u8) -> Option<Mbc> {
        match cart_type {
            0x00 | 0x08 | 0x09 => Some(Mbc::None),
            0x01..=0x03 => Some(Mbc::Mbc1 {
                rom_bank: 1,
                ram_bank: 0,
                banking_mode: 0,
                ram_enabled: false,
            }),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Cartridge {
    pub rom: Vec<u8>,
    pub ram: Vec<u8>,
    pub header: Header,
    mbc: Mbc,
}

impl Cartridge {
    /// Loads a cartridge from disk. A `.zip` archive is transparently
    /// unpacked, taking its first file entry as the image.
    pub fn from_file(path: &Path) -> io::Result<Cartridge> {
        let data = fs::read(path)?;
        let is_zip = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if is_zip {
            Self::from_bytes(unzip_first_entry(data)?)
        } else {
            Self::from_bytes(data)
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> io::Result<Cartridge> {
        let header = Header::parse(&data)?;

        let computed = Header::computed_checksum(&data);
        if computed != header.checksum {
            log::warn!(
                "header checksum mismatch: computed {computed:#04X}, header says {:#04X}",
                header.checksum
            );
        }

        let mbc = Mbc::for_type(header.cart_type).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported bank controller: {}", header.type_name),
            )
        })?;

        log::info!(
            "loaded \"{}\" ({}, {} bytes ROM, {} bytes RAM, {}, v{}, licensee: {})",
            header.title,
            header.type_name,
            header.rom_size,
            header.ram_size,
            header.destination,
            header.version,
            header.licensee,
        );

        let ram = vec![0u8; header.ram_size];
        Ok(Cartridge {
            rom: data,
            ram,
            header,
            mbc,
        })
    }

    /// Drops all banking state back to power-on values. RAM contents stay.
    pub fn reset(&mut self) {
        if let Some(mbc) = Mbc::for_type(self.header.cart_type) {
            self.mbc = mbc;
        }
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match (&self.mbc, addr) {
            (Mbc::None, 0x0000..=0x7FFF) => self.rom.get(addr as usize).copied().unwrap_or(0xFF),
            (Mbc::None, 0xA000..=0xBFFF) => {
                let off = (addr - 0xA000) as usize;
                self.ram.get(off).copied().unwrap_or(0xFF)
            }
            (Mbc::Mbc1 { ram_bank, banking_mode, .. }, 0x0000..=0x3FFF) => {
                // In mode 1 the fixed area maps the bank the high register
                // selects; everything is masked to the cartridge's bank count.
                let bank = if *banking_mode == 1 {
                    ((*ram_bank as usize) << 5) & self.rom_bank_mask()
                } else {
                    0
                };
                self.rom_read(bank, addr as usize)
            }
            (Mbc::Mbc1 { rom_bank, ram_bank, .. }, 0x4000..=0x7FFF) => {
                // The 5-bit register was already zero-adjusted at write time,
                // so masking here may legitimately land on bank 0.
                let bank =
                    (((*ram_bank as usize) << 5) | *rom_bank as usize) & self.rom_bank_mask();
                self.rom_read(bank, (addr - 0x4000) as usize)
            }
            (Mbc::Mbc1 { ram_enabled, ram_bank, banking_mode, .. }, 0xA000..=0xBFFF) => {
                if !*ram_enabled || self.ram.is_empty() {
                    return 0xFF;
                }
                self.ram[Self::ram_offset(self.ram.len(), addr, *ram_bank, *banking_mode)]
            }
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match (&mut self.mbc, addr) {
            (Mbc::None, 0xA000..=0xBFFF) => {
                let off = (addr - 0xA000) as usize;
                if off < self.ram.len() {
                    self.ram[off] = val;
                }
            }
            (Mbc::Mbc1 { ram_enabled, .. }, 0x0000..=0x1FFF) => {
                *ram_enabled = val & 0x0F == 0x0A;
            }
            (Mbc::Mbc1 { rom_bank, .. }, 0x2000..=0x3FFF) => {
                // Zero selects bank 1; the check applies to the full 5-bit
                // value, before any bank-count masking.
                let bank = val & 0x1F;
                *rom_bank = if bank == 0 { 1 } else { bank };
            }
            (Mbc::Mbc1 { ram_bank, .. }, 0x4000..=0x5FFF) => *ram_bank = val & 0x03,
            (Mbc::Mbc1 { banking_mode, .. }, 0x6000..=0x7FFF) => *banking_mode = val & 0x01,
            (Mbc::Mbc1 { ram_enabled, ram_bank, banking_mode, .. }, 0xA000..=0xBFFF) => {
                if *ram_enabled && !self.ram.is_empty() {
                    let off = Self::ram_offset(self.ram.len(), addr, *ram_bank, *banking_mode);
                    self.ram[off] = val;
                }
            }
            _ => {}
        }
    }

    fn rom_bank_count(&self) -> usize {
        (self.rom.len() / ROM_BANK_SIZE).max(1)
    }

    /// Bank numbers wrap at the next power of two covering the bank count.
    fn rom_bank_mask(&self) -> usize {
        self.rom_bank_count().next_power_of_two() - 1
    }

    fn rom_read(&self, bank: usize, offset: usize) -> u8 {
        self.rom
            .get(bank * ROM_BANK_SIZE + offset)
            .copied()
            .unwrap_or(0xFF)
    }

    fn ram_offset(ram_len: usize, addr: u16, ram_bank: u8, banking_mode: u8) -> usize {
        let rel = (addr - 0xA000) as usize;
        if ram_len > RAM_BANK_SIZE {
            if banking_mode == 1 {
                RAM_BANK_SIZE * ram_bank as usize + rel
            } else {
                rel
            }
        } else {
            // 2KB carts mirror through the whole window.
            rel % ram_len
        }
    }
}

fn unzip_first_entry(data: Vec<u8>) -> io::Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if entry.is_file() {
            let mut out = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut out)?;
            return Ok(out);
        }
    }
    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "archive contains no files",
    ))
}

fn cartridge_type_name(code: u8) -> Option<&'static str> {
    Some(match code {
        0x00 => "ROM ONLY",
        0x01 => "MBC1",
        0x02 => "MBC1+RAM",
        0x03 => "MBC1+RAM+BATTERY",
        0x05 => "MBC2",
        0x06 => "MBC2+BATTERY",
        0x08 => "ROM+RAM",
        0x09 => "ROM+RAM+BATTERY",
        0x0B => "MMM01",
        0x0C => "MMM01+RAM",
        0x0D => "MMM01+RAM+BATTERY",
        0x0F => "MBC3+TIMER+BATTERY",
        0x10 => "MBC3+TIMER+RAM+BATTERY",
        0x11 => "MBC3",
        0x12 => "MBC3+RAM",
        0x13 => "MBC3+RAM+BATTERY",
        0x19 => "MBC5",
        0x1A => "MBC5+RAM",
        0x1B => "MBC5+RAM+BATTERY",
        0x1C => "MBC5+RUMBLE",
        0x1D => "MBC5+RUMBLE+RAM",
        0x1E => "MBC5+RUMBLE+RAM+BATTERY",
        0x20 => "MBC6",
        0x22 => "MBC7+SENSOR+RUMBLE+RAM+BATTERY",
        0xFC => "POCKET CAMERA",
        0xFD => "BANDAI TAMA5",
        0xFE => "HuC3",
        0xFF => "HuC1+RAM+BATTERY",
        _ => return None,
    })
}

fn rom_size_bytes(code: u8) -> Option<usize> {
    Some(match code {
        0x00 => 0x8000,
        0x01 => 0x10000,
        0x02 => 0x20000,
        0x03 => 0x40000,
        0x04 => 0x80000,
        0x05 => 0x100000,
        0x06 => 0x200000,
        0x07 => 0x400000,
        0x08 => 0x800000,
        _ => return None,
    })
}

fn ram_size_bytes(code: u8) -> Option<usize> {
    Some(match code {
        0x00 => 0,
        0x01 => 0x800,
        0x02 => 0x2000,
        0x03 => 0x8000,
        0x04 => 0x20000,
        0x05 => 0x10000,
        _ => return None,
    })
}

fn old_licensee_name(code: u8) -> &'static str {
    match code {
        0x00 => "None",
        0x01 => "Nintendo",
        0x08 => "Capcom",
        0x09 => "HOT-B",
        0x0A => "Jaleco",
        0x0B => "Coconuts Japan",
        0x0C => "Elite Systems",
        0x13 => "EA (Electronic Arts)",
        0x18 => "Hudson Soft",
        0x19 => "ITC Entertainment",
        0x1A => "Yanoman",
        0x1D => "Japan Clary",
        0x1F => "Virgin Games Ltd.",
        0x24 => "PCM Complete",
        0x25 => "San-X",
        0x28 => "Kemco",
        0x29 => "SETA Corporation",
        0x30 => "Infogrames",
        0x31 => "Nintendo",
        0x32 => "Bandai",
        0x34 => "Konami",
        0x35 => "HectorSoft",
        0x38 => "Capcom",
        0x39 => "Banpresto",
        0x3C => "Entertainment Interactive",
        0x3E => "Gremlin",
        0x41 => "Ubi Soft",
        0x42 => "Atlus",
        0x44 => "Malibu Interactive",
        0x46 => "Angle",
        0x47 => "Spectrum HoloByte",
        0x49 => "Irem",
        0x4A => "Virgin Games Ltd.",
        0x4D => "Maliby Interactive",
        0x4F => "U.S. Gold",
        0x50 => "Absolute",
        0x51 => "Acclaim Entertainment",
        0x52 => "Activision",
        0x53 => "Sammy USA Corporation",
        0x54 => "GameTek",
        0x55 => "Park Place",
        0x56 => "LJN",
        0x57 => "Matchbox",
        0x59 => "Milton Bradley Company",
        0x5A => "Mindscape",
        0x5B => "Romstar",
        0x5C => "Naxat Soft",
        0x5D => "Tradewest",
        0x60 => "Titus Interactive",
        0x61 => "Virgin Games Ltd.",
        0x67 => "Ocean Software",
        0x69 => "EA (Electronic Arts)",
        0x6E => "Elite Systems",
        0x6F => "Electro Brain",
        0x70 => "Infogrames",
        0x71 => "Interplay Entertainment",
        0x72 => "Broderbund",
        0x73 => "Sculptured Software",
        0x75 => "The Sales Curve Limited",
        0x78 => "THQ",
        0x79 => "Accolade",
        0x7A => "Triffix Entertainment",
        0x7C => "MicroProse",
        0x7F => "Kemco",
        0x80 => "Misawa Entertainment",
        0x83 => "LOZC G.",
        0x86 => "Tokuma Shoten",
        0x8B => "Bullet-Proof Software",
        0x8C => "Vic Tokai Corp.",
        0x8E => "Ape Inc.",
        0x8F => "I'Max",
        0x91 => "Chunsoft Co.",
        0x92 => "Video System",
        0x93 => "Tsubaraya Productions",
        0x95 => "Varie",
        0x96 => "Yonezawa/S'Pal",
        0x97 => "Kemco",
        0x99 => "Arc",
        0x9A => "Nihon Bussan",
        0x9B => "Tecmo",
        0x9C => "Imangineer",
        0x9D => "Banpresto",
        0x9F => "Nova",
        0xA1 => "Hori Electric",
        0xA2 => "Bandai",
        0xA4 => "Konami",
        0xA6 => "Kawada",
        0xA7 => "Takara",
        0xA9 => "Technos Japan",
        0xAA => "Broderbund",
        0xAC => "Toei Animation",
        0xAD => "Toho",
        0xAF => "Namco",
        0xB0 => "Acclaim Entertainment",
        0xB1 => "ASCII Corporation or Nexsoft",
        0xB2 => "Bandai",
        0xB4 => "Square Enix",
        0xB6 => "HAL Laboratory",
        0xB7 => "SNK",
        0xB9 => "Pony Canyon",
        0xBA => "Culture Brain",
        0xBB => "Sunsoft",
        0xBD => "Sony Imagesoft",
        0xBF => "Sammy Corporation",
        0xC0 => "Taito",
        0xC2 => "Kemco",
        0xC3 => "Square",
        0xC4 => "Tokuma Shoten",
        0xC5 => "Data East",
        0xC6 => "Tonkin House",
        0xC8 => "Koei",
        0xC9 => "UFL",
        0xCA => "Ultra Games",
        0xCB => "VAP, Inc.",
        0xCC => "Use Corporation",
        0xCD => "Meldac",
        0xCE => "Pony Canyon",
        0xCF => "Angel",
        0xD0 => "Taito",
        0xD1 => "SOFEL (Software Engineering Lab)",
        0xD2 => "Quest",
        0xD3 => "Sigma Enterprises",
        0xD4 => "ASK Kodansha Co.",
        0xD6 => "Naxat Soft",
        0xD7 => "Copya System",
        0xD9 => "Banpresto",
        0xDA => "Tony",
        0xDB => "LJN",
        0xDD => "Nippon Computer Systems",
        0xDE => "Human Ent.",
        0xDF => "Altron",
        0xE0 => "Jaleco",
        0xE1 => "Towa Chiki",
        0xE2 => "Yutaka",
        0xE3 => "Varie",
        0xE5 => "Epoch",
        0xE6 => "Athena",
        0xE8 => "Asmik Ace Entertainment",
        0xE9 => "Natsume",
        0xEA => "King Records",
        0xEB => "Atlus",
        0xEC => "Epic/Sony Records",
        0xEE => "IGS",
        0xF0 => "A Wave",
        0xF3 => "Extreme Entertainment",
        0xFF => "LJN",
        _ => "Unknown",
    }
}

fn new_licensee_name(code: &[u8; 2]) -> &'static str {
    match code {
        b"00" => "None",
        b"01" => "Nintendo Research & Development 1",
        b"08" => "Capcom",
        b"13" => "EA (Electronic Arts)",
        b"18" => "Hudson Soft",
        b"19" => "B-AI",
        b"20" => "KSS",
        b"22" => "Planning Office WADA",
        b"24" => "PCM Complete",
        b"25" => "San-X",
        b"28" => "Kemco",
        b"29" => "SETA Corporation",
        b"30" => "Viacom",
        b"31" => "Nintendo",
        b"32" => "Bandai",
        b"33" => "Ocean Software/Acclaim Entertainment",
        b"34" => "Konami",
        b"35" => "HectorSoft",
        b"37" => "Taito",
        b"38" => "Hudson Soft",
        b"39" => "Banpresto",
        b"41" => "Ubi Soft",
        b"42" => "Atlus",
        b"44" => "Malibu Interactive",
        b"46" => "Angel",
        b"47" => "Bullet-Proof Software",
        b"49" => "Irem",
        b"50" => "Absolute",
        b"51" => "Acclaim Entertainment",
        b"52" => "Activision",
        b"53" => "Sammy USA Corporation",
        b"54" => "Konami",
        b"55" => "Hi Tech Expressions",
        b"56" => "LJN",
        b"57" => "Matchbox",
        b"58" => "Mattel",
        b"59" => "Milton Bradley Company",
        b"60" => "Titus Interactive",
        b"61" => "Virgin Games Ltd.",
        b"64" => "Lucasfilm Games",
        b"67" => "Ocean Software",
        b"69" => "EA (Electronic Arts)",
        b"70" => "Infogrames",
        b"71" => "Interplay Entertainment",
        b"72" => "Broderbund",
        b"73" => "Sculptured Software",
        b"75" => "The Sales Curve Limited",
        b"78" => "THQ",
        b"79" => "Accolade",
        b"80" => "Misawa Entertainment",
        b"83" => "lozc",
        b"86" => "Tokuma Shoten",
        b"87" => "Tsukuda Original",
        b"91" => "Chunsoft Co.",
        b"92" => "Video System",
        b"93" => "Ocean Software/Acclaim Entertainment",
        b"95" => "Varie",
        b"96" => "Yonezawa/s'pal",
        b"97" => "Kaneko",
        b"99" => "Pack-In-Video",
        b"9H" => "Bottom Up",
        b"A4" => "Konami (Yu-Gi-Oh!)",
        b"BL" => "MTO",
        b"DK" => "Kodansha",
        b"ZZ" => "Mooneye",
        _ => "Unknown",
    }
}
