//! Interrupt controller: the IF (flagged) and IE (enabled) registers.

/// The five interrupt sources, in priority order (lowest bit wins).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Interrupt {
    VBlank,
    LcdStat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    pub fn mask(self) -> u8 {
        match self {
            Interrupt::VBlank => 0x01,
            Interrupt::LcdStat => 0x02,
            Interrupt::Timer => 0x04,
            Interrupt::Serial => 0x08,
            Interrupt::Joypad => 0x10,
        }
    }

    pub fn vector(self) -> u16 {
        match self {
            Interrupt::VBlank => 0x0040,
            Interrupt::LcdStat => 0x0048,
            Interrupt::Timer => 0x0050,
            Interrupt::Serial => 0x0058,
            Interrupt::Joypad => 0x0060,
        }
    }
}

pub struct Interrupts {
    flagged: u8, // FF0F
    enabled: u8, // FFFF
}

impl Interrupts {
    pub fn new() -> Self {
        Self {
            flagged: 0xE1,
            enabled: 0x00,
        }
    }

    pub fn set(&mut self, int: Interrupt) {
        self.flagged |= int.mask();
    }

    pub fn clear(&mut self, int: Interrupt) {
        self.flagged &= !int.mask();
    }

    pub fn enable(&mut self, int: Interrupt) {
        self.enabled |= int.mask();
    }

    pub fn disable(&mut self, int: Interrupt) {
        self.enabled &= !int.mask();
    }

    pub fn flagged(&self) -> u8 {
        self.flagged
    }

    pub fn enabled(&self) -> u8 {
        self.enabled
    }

    /// IF writes only touch the five source bits; bits 5-7 read back as set.
    pub fn write_flagged(&mut self, val: u8) {
        self.flagged = (self.flagged & 0xE0) | (val & 0x1F);
    }

    pub fn write_enabled(&mut self, val: u8) {
        self.enabled = val;
    }

    pub fn pending(&self) -> u8 {
        self.flagged & self.enabled & 0x1F
    }

    /// Highest-priority pending interrupt, if any.
    pub fn next_pending(&self) -> Option<Interrupt> {
        let pending = self.pending();
        if pending & 0x01 != 0 {
            Some(Interrupt::VBlank)
        } else if pending & 0x02 != 0 {
            Some(Interrupt::LcdStat)
        } else if pending & 0x04 != 0 {
            Some(Interrupt::Timer)
        } else if pending & 0x08 != 0 {
            Some(Interrupt::Serial)
        } else if pending & 0x10 != 0 {
            Some(Interrupt::Joypad)
        } else {
            None
        }
    }
}

impl Default for Interrupts {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_flags() {
        let mut ints = Interrupts::new();
        ints.set(Interrupt::Timer);
        assert_eq!(ints.flagged() & 0x1F, 0x05); // vblank flagged at power-on
        ints.clear(Interrupt::Timer);
        ints.clear(Interrupt::VBlank);
        assert_eq!(ints.flagged() & 0x1F, 0x00);
    }

    #[test]
    fn pending_requires_both_bytes() {
        let mut ints = Interrupts::new();
        ints.write_flagged(0x00);
        ints.set(Interrupt::Serial);
        assert_eq!(ints.pending(), 0x00);
        ints.enable(Interrupt::Serial);
        assert_eq!(ints.pending(), 0x08);
        ints.disable(Interrupt::Serial);
        assert_eq!(ints.pending(), 0x00);
    }

    #[test]
    fn if_write_preserves_upper_bits() {
        let mut ints = Interrupts::new();
        ints.write_flagged(0x05);
        assert_eq!(ints.flagged(), 0xE5);
        ints.write_flagged(0xFF);
        assert_eq!(ints.flagged(), 0xFF);
        ints.write_flagged(0x00);
        assert_eq!(ints.flagged(), 0xE0);
    }

    #[test]
    fn lowest_bit_has_priority() {
        let mut ints = Interrupts::new();
        ints.write_flagged(0x00);
        ints.write_enabled(0x1F);
        ints.set(Interrupt::Joypad);
        ints.set(Interrupt::Timer);
        assert_eq!(ints.next_pending(), Some(Interrupt::Timer));
        ints.set(Interrupt::VBlank);
        assert_eq!(ints.next_pending(), Some(Interrupt::VBlank));
        ints.write_flagged(0x00);
        assert_eq!(ints.next_pending(), None);
    }

    #[test]
    fn vectors_and_masks() {
        assert_eq!(Interrupt::VBlank.vector(), 0x0040);
        assert_eq!(Interrupt::LcdStat.vector(), 0x0048);
        assert_eq!(Interrupt::Timer.vector(), 0x0050);
        assert_eq!(Interrupt::Serial.vector(), 0x0058);
        assert_eq!(Interrupt::Joypad.vector(), 0x0060);
        assert_eq!(Interrupt::Joypad.mask(), 0x10);
    }
}
