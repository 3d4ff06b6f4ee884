use dotmatrix_core::mmu::Mmu;
use dotmatrix_core::ppu::Mode;

/// Ticks one machine cycle at a time so no mode boundary is skipped.
fn tick_cycles(mmu: &mut Mmu, cycles: u32) {
    for _ in 0..cycles {
        mmu.tick(1);
    }
}

#[test]
fn mode_sequence_across_a_scanline() {
    let mut mmu = Mmu::new();
    mmu.tick(1);
    assert_eq!(mmu.ppu.mode, Mode::OamSearch);
    assert_eq!(mmu.read_byte(0xFF41) & 0x03, 2);

    tick_cycles(&mut mmu, 19); // clock 20
    assert_eq!(mmu.ppu.mode, Mode::PixelTransfer);
    assert_eq!(mmu.read_byte(0xFF41) & 0x03, 3);

    tick_cycles(&mut mmu, 43); // clock 63
    assert_eq!(mmu.ppu.mode, Mode::HBlank);
    assert_eq!(mmu.read_byte(0xFF41) & 0x03, 0);

    tick_cycles(&mut mmu, 51); // clock 114, next line
    assert_eq!(mmu.ppu.mode, Mode::OamSearch);
    assert_eq!(mmu.read_byte(0xFF44), 1);
}

#[test]
fn vblank_begins_at_line_144() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF0F, 0x00);
    tick_cycles(&mut mmu, 144 * 114);
    assert_eq!(mmu.ppu.mode, Mode::VBlank);
    assert_eq!(mmu.read_byte(0xFF44), 144);
    assert_ne!(mmu.interrupts.flagged() & 0x01, 0);
    assert!(mmu.ppu.frame_ready());
}

#[test]
fn lyc_interrupt_fires_when_the_line_is_reached() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF45, 2);
    mmu.write_byte(0xFF41, 0x40);
    mmu.write_byte(0xFF0F, 0x00);

    tick_cycles(&mut mmu, 227);
    assert_eq!(mmu.interrupts.flagged() & 0x02, 0, "fired a line early");
    mmu.tick(1); // LY becomes 2 here
    assert_ne!(mmu.interrupts.flagged() & 0x02, 0);
    assert_ne!(mmu.read_byte(0xFF41) & 0x04, 0); // coincidence bit
}

#[test]
fn stat_mode_interrupts_follow_their_select_bits() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF41, 0x08); // H-Blank select
    mmu.write_byte(0xFF0F, 0x00);
    tick_cycles(&mut mmu, 63);
    assert_ne!(mmu.interrupts.flagged() & 0x02, 0);

    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF41, 0x20); // OAM select
    mmu.write_byte(0xFF0F, 0x00);
    mmu.tick(1);
    assert_ne!(mmu.interrupts.flagged() & 0x02, 0);
}

#[test]
fn disabled_lcd_parks_in_hblank() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF40, 0x11); // enable bit off
    mmu.write_byte(0xFF0F, 0x00);
    tick_cycles(&mut mmu, 200);
    assert_eq!(mmu.ppu.mode, Mode::HBlank);
    assert_eq!(mmu.read_byte(0xFF41) & 0x03, 0);
    assert_eq!(mmu.interrupts.flagged() & 0x03, 0);
}

#[test]
fn background_tiles_render_with_scroll() {
    let mut mmu = Mmu::new();
    // tile 1 is solid colour 1; the map's top-left cell points at it
    for row in 0..8u16 {
        mmu.write_byte(0x8010 + row * 2, 0xFF);
    }
    mmu.write_byte(0x9800, 0x01);
    mmu.write_byte(0xFF47, 0xE4); // identity palette
    mmu.ppu.refresh_tile_maps();

    tick_cycles(&mut mmu, 20); // line 0 composes on entering pixel transfer
    let frame = mmu.ppu.viewport();
    assert_eq!(frame[0][0], 1);
    assert_eq!(frame[0][7], 1);
    assert_eq!(frame[0][8], 0); // the neighbouring tile is blank

    // scroll four pixels: the tile's right half slides off screen
    mmu.write_byte(0xFF43, 4);
    tick_cycles(&mut mmu, 17556); // same line, next frame
    let frame = mmu.ppu.viewport();
    assert_eq!(frame[0][0], 1);
    assert_eq!(frame[0][3], 1);
    assert_eq!(frame[0][4], 0);
}

#[test]
fn window_overlays_from_its_left_edge() {
    let mut mmu = Mmu::new();
    // window map 1 points at tile 2, which is solid colour 2
    for row in 0..8u16 {
        mmu.write_byte(0x8021 + row * 2, 0xFF);
    }
    mmu.write_byte(0x9C00, 0x02);
    mmu.write_byte(0xFF40, 0xF1); // window on, window map 1
    mmu.write_byte(0xFF47, 0xE4);
    mmu.write_byte(0xFF4A, 0x00);
    mmu.write_byte(0xFF4B, 0x04);
    mmu.ppu.refresh_tile_maps();

    tick_cycles(&mut mmu, 20);
    let frame = mmu.ppu.viewport();
    assert_eq!(frame[0][3], 0); // background shows left of the window
    assert_eq!(frame[0][4], 2); // window starts exactly at WX
    assert_eq!(frame[0][11], 2);
    assert_eq!(frame[0][12], 0); // blank window tile past the first
}

#[test]
fn first_sprite_in_oam_wins_overlaps() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF40, 0x93); // switch sprites on
    // tile 1 paints colour 1, tile 2 paints colour 2
    for row in 0..8u16 {
        mmu.write_byte(0x8010 + row * 2, 0xFF);
        mmu.write_byte(0x8021 + row * 2, 0xFF);
    }
    mmu.write_byte(0xFF48, 0xE4);
    // two sprites stacked on the top-left corner
    for (i, byte) in [16u8, 8, 1, 0, 16, 8, 2, 0].into_iter().enumerate() {
        mmu.write_byte(0xFE00 + i as u16, byte);
    }

    tick_cycles(&mut mmu, 20);
    assert_eq!(mmu.ppu.viewport()[0][0], 1);
    assert_eq!(mmu.ppu.viewport()[0][7], 1);
}

#[test]
fn behind_flag_defers_to_background_colour() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF40, 0x93);
    // background tile 1 covers the first map cell; sprite tile 2 sits behind
    for row in 0..8u16 {
        mmu.write_byte(0x8010 + row * 2, 0xFF);
        mmu.write_byte(0x8021 + row * 2, 0xFF);
    }
    mmu.write_byte(0x9800, 0x01);
    mmu.write_byte(0xFF47, 0xE4);
    mmu.write_byte(0xFF48, 0xE4);
    for (i, byte) in [16u8, 8, 2, 0x80].into_iter().enumerate() {
        mmu.write_byte(0xFE00 + i as u16, byte);
    }
    mmu.ppu.refresh_tile_maps();

    tick_cycles(&mut mmu, 20);
    let frame = mmu.ppu.viewport();
    assert_eq!(frame[0][0], 1); // the opaque background wins
    assert_eq!(frame[0][8], 0); // past the sprite, plain background again
}

#[test]
fn sprite_flips_mirror_the_tile() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF40, 0x93);
    // tile 1: only the leftmost pixel of the top row is set
    mmu.write_byte(0x8010, 0x80);
    mmu.write_byte(0xFF48, 0xE4);
    for (i, byte) in [16u8, 8, 1, 0x20].into_iter().enumerate() {
        mmu.write_byte(0xFE00 + i as u16, byte); // X flip
    }

    tick_cycles(&mut mmu, 20);
    let frame = mmu.ppu.viewport();
    assert_eq!(frame[0][0], 0);
    assert_eq!(frame[0][7], 1); // the lit pixel moved to the right edge
}

#[test]
fn tall_sprites_mask_the_tile_index() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF40, 0x97); // sprites on, 8x16
    // even/odd tile pair 2/3: top half colour 1, bottom half colour 2
    for row in 0..8u16 {
        mmu.write_byte(0x8020 + row * 2, 0xFF);
        mmu.write_byte(0x8031 + row * 2, 0xFF);
    }
    mmu.write_byte(0xFF48, 0xE4);
    // the odd index is ignored in tall mode
    for (i, byte) in [16u8, 8, 3, 0].into_iter().enumerate() {
        mmu.write_byte(0xFE00 + i as u16, byte);
    }

    tick_cycles(&mut mmu, 20); // line 0 comes from the even tile
    assert_eq!(mmu.ppu.viewport()[0][0], 1);

    tick_cycles(&mut mmu, 8 * 114); // line 8 comes from the odd tile
    assert_eq!(mmu.ppu.viewport()[8][0], 2);
}

#[test]
fn lcdc_layout_writes_mark_the_maps_stale() {
    let mut mmu = Mmu::new();
    // the same VRAM decodes differently once the map select flips
    mmu.write_byte(0x9800, 0x01);
    mmu.write_byte(0x9C00, 0x02);
    for row in 0..8u16 {
        mmu.write_byte(0x8010 + row * 2, 0xFF);
        mmu.write_byte(0x8021 + row * 2, 0xFF);
    }
    mmu.write_byte(0xFF47, 0xE4);
    mmu.ppu.refresh_tile_maps();
    tick_cycles(&mut mmu, 20);
    assert_eq!(mmu.ppu.viewport()[0][0], 1);

    mmu.write_byte(0xFF40, 0x99); // background map 1
    tick_cycles(&mut mmu, 17556); // the vblank refresh picks up the change
    assert_eq!(mmu.ppu.viewport()[0][0], 2);
}
