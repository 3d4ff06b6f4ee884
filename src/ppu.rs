//! Pixel processing unit.
//!
//! The frame is tracked with a single wrapping m-cycle counter; LY and the
//! STAT mode both derive from it. Tile maps are decoded from VRAM into
//! full-resolution index planes, refreshed lazily at VBlank, and scanlines
//! are composed from those planes when OAM search ends.

use crate::interrupts::{Interrupt, Interrupts};

// Screen resolution of the LCD viewport
pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

// Frame timing in m-cycles
const CYCLES_PER_LINE: u32 = 114;
const CYCLES_PER_FRAME: u32 = 17556;
const VBLANK_START: u32 = CYCLES_PER_LINE * SCREEN_HEIGHT as u32;
const OAM_SEARCH_CYCLES: u32 = 20;
const PIXEL_TRANSFER_END: u32 = 63;

// Sprite limits
const MAX_SPRITES_PER_LINE: usize = 10;
const TOTAL_SPRITES: usize = 40;

// Internal memory sizes
const VRAM_SIZE: usize = 0x2000;
const OAM_SIZE: usize = 0xA0;

// VRAM layout
const MAP_0_BASE: usize = 0x1800;
const MAP_1_BASE: usize = 0x1C00;
const TILE_DATA_SIGNED_BASE: usize = 0x1000;
const MAP_DIM: usize = 256;

// LCDC bits
const LCDC_ENABLE: u8 = 0x80;
const LCDC_WIN_MAP: u8 = 0x40;
const LCDC_WIN_ENABLE: u8 = 0x20;
const LCDC_TILE_DATA: u8 = 0x10;
const LCDC_BG_MAP: u8 = 0x08;
const LCDC_OBJ_SIZE: u8 = 0x04;
const LCDC_OBJ_ENABLE: u8 = 0x02;
const LCDC_BG_ENABLE: u8 = 0x01;

// STAT bits
const STAT_LYC_INT: u8 = 0x40;
const STAT_MODE2_INT: u8 = 0x20;
const STAT_MODE1_INT: u8 = 0x10;
const STAT_MODE0_INT: u8 = 0x08;
const STAT_LYC_EQUAL: u8 = 0x04;
const STAT_WRITABLE: u8 = 0x78;

// OAM attribute bits
const ATTR_PRIORITY: u8 = 0x80;
const ATTR_Y_FLIP: u8 = 0x40;
const ATTR_X_FLIP: u8 = 0x20;
const ATTR_PALETTE: u8 = 0x10;

/// STAT mode numbers as games observe them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    PixelTransfer = 3,
}

pub struct Ppu {
    pub vram: [u8; VRAM_SIZE],
    pub oam: [u8; OAM_SIZE],

    lcdc: u8,
    /// Only the interrupt-select bits; the rest of STAT is derived on read.
    stat: u8,
    scy: u8,
    scx: u8,
    lyc: u8,
    dma: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,

    pub mode: Mode,
    clock: u32,
    ly: u8,

    bg_palette: [u8; 4],
    obj0_palette: [u8; 4],
    obj1_palette: [u8; 4],

    /// Set on VRAM writes and layout-bit changes; cleared by a map refresh.
    vram_dirty: bool,
    bg_map: [[u8; MAP_DIM]; MAP_DIM],
    win_map: [[u8; MAP_DIM]; MAP_DIM],

    /// OAM byte offsets of the sprites picked for the current scanline
    line_sprites: [usize; MAX_SPRITES_PER_LINE],
    sprite_count: usize,

    viewport: [[u8; SCREEN_WIDTH]; SCREEN_HEIGHT],
    frame_ready: bool,
}

impl Ppu {
    pub fn new() -> Self {
        let mut ppu = Ppu {
            vram: [0; VRAM_SIZE],
            oam: [0; OAM_SIZE],
            lcdc: 0x91,
            stat: 0x00,
            scy: 0,
            scx: 0,
            lyc: 0,
            dma: 0xFF,
            bgp: 0xFC,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            mode: Mode::VBlank,
            clock: 0,
            ly: 0,
            bg_palette: [0; 4],
            obj0_palette: [0; 4],
            obj1_palette: [0; 4],
            vram_dirty: true,
            bg_map: [[0; MAP_DIM]; MAP_DIM],
            win_map: [[0; MAP_DIM]; MAP_DIM],
            line_sprites: [0; MAX_SPRITES_PER_LINE],
            sprite_count: 0,
            viewport: [[0; SCREEN_WIDTH]; SCREEN_HEIGHT],
            frame_ready: false,
        };
        ppu.bg_palette = decode_palette(ppu.bgp);
        ppu.obj0_palette = decode_palette(ppu.obp0);
        ppu.obj1_palette = decode_palette(ppu.obp1);
        ppu
    }

    /// Advances the frame counter and fires at most one mode transition.
    /// Callers tick in per-instruction quanta, which keeps every boundary
    /// observable.
    pub fn step(&mut self, cycles: u32, ints: &mut Interrupts) {
        self.clock = (self.clock + cycles) % CYCLES_PER_FRAME;

        let line = (self.clock / CYCLES_PER_LINE) as u8;
        if line != self.ly {
            self.ly = line;
            if self.ly == self.lyc && self.stat & STAT_LYC_INT != 0 {
                ints.set(Interrupt::LcdStat);
            }
        }

        let next = self.mode_for_clock();
        if next == self.mode {
            return;
        }
        let prev = self.mode;
        self.mode = next;
        #[cfg(feature = "ppu-trace")]
        log::trace!("mode {prev:?} -> {next:?} at clock {}", self.clock);

        match prev {
            Mode::OamSearch => self.compose_scanline(),
            Mode::PixelTransfer => self.enter_hblank(ints),
            Mode::HBlank => {
                if next == Mode::VBlank {
                    self.enter_vblank(ints);
                } else {
                    self.oam_search(ints);
                }
            }
            Mode::VBlank => self.oam_search(ints),
        }
    }

    fn mode_for_clock(&self) -> Mode {
        if self.lcdc & LCDC_ENABLE == 0 {
            return Mode::HBlank;
        }
        if self.clock >= VBLANK_START {
            return Mode::VBlank;
        }
        let line_clock = self.clock % CYCLES_PER_LINE;
        if line_clock < OAM_SEARCH_CYCLES {
            Mode::OamSearch
        } else if line_clock < PIXEL_TRANSFER_END {
            Mode::PixelTransfer
        } else {
            Mode::HBlank
        }
    }

    fn enter_hblank(&mut self, ints: &mut Interrupts) {
        if self.stat & STAT_MODE0_INT != 0 {
            ints.set(Interrupt::LcdStat);
        }
    }

    fn enter_vblank(&mut self, ints: &mut Interrupts) {
        self.frame_ready = true;
        ints.set(Interrupt::VBlank);
        if self.stat & STAT_MODE1_INT != 0 {
            ints.set(Interrupt::LcdStat);
        }
        if self.vram_dirty {
            self.refresh_tile_maps();
        }
        #[cfg(feature = "ppu-trace")]
        log::trace!("frame complete, ly back to vblank at clock {}", self.clock);
    }

    /// Picks up to 10 sprites for the new scanline, in OAM order.
    fn oam_search(&mut self, ints: &mut Interrupts) {
        self.sprite_count = 0;
        if self.stat & STAT_MODE2_INT != 0 {
            ints.set(Interrupt::LcdStat);
        }
        if self.lcdc & LCDC_OBJ_ENABLE == 0 {
            return;
        }
        let height: i32 = if self.lcdc & LCDC_OBJ_SIZE != 0 { 16 } else { 8 };
        let line = self.ly as i32;
        for i in 0..TOTAL_SPRITES {
            if self.sprite_count >= MAX_SPRITES_PER_LINE {
                break;
            }
            let base = i * 4;
            let y = self.oam[base] as i32 - 16;
            let x = self.oam[base + 1];
            if x != 0 && line >= y && line < y + height {
                self.line_sprites[self.sprite_count] = base;
                self.sprite_count += 1;
            }
        }
    }

    /// Draws the line the PPU just scanned into the viewport.
    fn compose_scanline(&mut self) {
        let ly = self.ly as usize;
        if ly >= SCREEN_HEIGHT {
            return;
        }

        let mut raw = [0u8; SCREEN_WIDTH];
        // 0 = background, 1 = window, 2 = OBP0 sprite, 3 = OBP1 sprite
        let mut source = [0u8; SCREEN_WIDTH];

        if self.lcdc & LCDC_BG_ENABLE != 0 {
            let map_y = (self.scy as usize + ly) % MAP_DIM;
            for (x, out) in raw.iter_mut().enumerate() {
                let map_x = (self.scx as usize + x) % MAP_DIM;
                *out = self.bg_map[map_y][map_x];
            }
        }

        if self.lcdc & LCDC_WIN_ENABLE != 0
            && self.lcdc & LCDC_BG_ENABLE != 0
            && self.ly >= self.wy
        {
            let win_y = (self.ly - self.wy) as usize;
            let start = (self.wx as usize).min(SCREEN_WIDTH);
            for x in start..SCREEN_WIDTH {
                raw[x] = self.win_map[win_y][x - start];
                source[x] = 1;
            }
        }

        if self.lcdc & LCDC_OBJ_ENABLE != 0 {
            let tall = self.lcdc & LCDC_OBJ_SIZE != 0;
            for slot in 0..self.sprite_count {
                let base = self.line_sprites[slot];
                let y = self.oam[base] as i32 - 16;
                let x = self.oam[base + 1] as i32 - 8;
                let mut tile = self.oam[base + 2];
                let attrs = self.oam[base + 3];

                let height = if tall { 16 } else { 8 };
                let mut row = (self.ly as i32 - y) as usize;
                if attrs & ATTR_Y_FLIP != 0 {
                    row = height - 1 - row;
                }
                if tall {
                    tile &= 0xFE;
                }
                let addr = tile as usize * 16 + row * 2;
                let lo = self.vram[addr];
                let hi = self.vram[addr + 1];

                for px in 0..8usize {
                    let sx = x + px as i32;
                    if !(0..SCREEN_WIDTH as i32).contains(&sx) {
                        continue;
                    }
                    let sx = sx as usize;
                    // An earlier OAM entry already claimed this pixel.
                    if source[sx] >= 2 {
                        continue;
                    }
                    let bit = if attrs & ATTR_X_FLIP != 0 { px } else { 7 - px };
                    let idx = ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1);
                    if idx == 0 {
                        continue;
                    }
                    if attrs & ATTR_PRIORITY != 0 && raw[sx] != 0 {
                        continue;
                    }
                    raw[sx] = idx;
                    source[sx] = if attrs & ATTR_PALETTE != 0 { 3 } else { 2 };
                }
            }
        }

        for x in 0..SCREEN_WIDTH {
            let idx = raw[x] as usize;
            self.viewport[ly][x] = match source[x] {
                2 => self.obj0_palette[idx],
                3 => self.obj1_palette[idx],
                _ => self.bg_palette[idx],
            };
        }
    }

    /// Re-decodes both tile maps from VRAM using the current LCDC layout.
    pub fn refresh_tile_maps(&mut self) {
        self.vram_dirty = false;
        let signed_data = self.lcdc & LCDC_TILE_DATA == 0;
        let bg_base = if self.lcdc & LCDC_BG_MAP != 0 { MAP_1_BASE } else { MAP_0_BASE };
        let win_base = if self.lcdc & LCDC_WIN_MAP != 0 { MAP_1_BASE } else { MAP_0_BASE };
        decode_map(&self.vram, bg_base, signed_data, &mut self.bg_map);
        decode_map(&self.vram, win_base, signed_data, &mut self.win_map);
    }

    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram[(addr & 0x1FFF) as usize]
    }

    pub fn write_vram(&mut self, addr: u16, val: u8) {
        self.vram[(addr & 0x1FFF) as usize] = val;
        self.vram_dirty = true;
    }

    pub fn read_oam(&self, addr: u16) -> u8 {
        self.oam[(addr as usize - 0xFE00) % OAM_SIZE]
    }

    pub fn write_oam(&mut self, addr: u16, val: u8) {
        self.oam[(addr as usize - 0xFE00) % OAM_SIZE] = val;
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc,
            0xFF41 => {
                0x80 | self.stat
                    | if self.ly == self.lyc { STAT_LYC_EQUAL } else { 0 }
                    | self.mode as u8
            }
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF46 => self.dma,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    pub fn write_reg(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF40 => {
                if (self.lcdc ^ val) & (LCDC_WIN_MAP | LCDC_TILE_DATA | LCDC_BG_MAP) != 0 {
                    self.vram_dirty = true;
                }
                self.lcdc = val;
            }
            0xFF41 => self.stat = val & STAT_WRITABLE,
            0xFF42 => self.scy = val,
            0xFF43 => self.scx = val,
            0xFF44 => {} // LY is read-only
            0xFF45 => self.lyc = val,
            0xFF46 => self.dma = val, // the OAM copy itself is done by the bus
            0xFF47 => {
                self.bgp = val;
                self.bg_palette = decode_palette(val);
            }
            0xFF48 => {
                self.obp0 = val;
                self.obj0_palette = decode_palette(val);
            }
            0xFF49 => {
                self.obp1 = val;
                self.obj1_palette = decode_palette(val);
            }
            0xFF4A => self.wy = val,
            0xFF4B => self.wx = val,
            _ => {}
        }
    }

    /// Returns true once a full frame has been composed.
    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    /// The finished frame as 2-bit shades, one row per scanline.
    pub fn viewport(&self) -> &[[u8; SCREEN_WIDTH]; SCREEN_HEIGHT] {
        &self.viewport
    }

    /// Clears the frame flag after the viewport has been consumed.
    pub fn clear_frame_flag(&mut self) {
        self.frame_ready = false;
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

/// Expands a DMG palette register into per-index shades.
fn decode_palette(mut byte: u8) -> [u8; 4] {
    let mut pal = [0u8; 4];
    for entry in &mut pal {
        *entry = byte & 0x03;
        byte >>= 2;
    }
    pal
}

fn decode_map(
    vram: &[u8; VRAM_SIZE],
    map_base: usize,
    signed_data: bool,
    out: &mut [[u8; MAP_DIM]; MAP_DIM],
) {
    for ty in 0..32 {
        for tx in 0..32 {
            let tile = vram[map_base + ty * 32 + tx];
            let data_base = if signed_data {
                (TILE_DATA_SIGNED_BASE as i32 + tile as i8 as i32 * 16) as usize
            } else {
                tile as usize * 16
            };
            for row in 0..8 {
                let lo = vram[data_base + row * 2];
                let hi = vram[data_base + row * 2 + 1];
                for col in 0..8 {
                    let bit = 7 - col;
                    out[ty * 8 + row][tx * 8 + col] = ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1);
                }
            }
        }
    }
}
