//! Joypad register (JOYP) and button state.
//!
//! Button state lives in one gate byte, directions in the low nibble and
//! action buttons in the high nibble, with a clear bit meaning "held" to
//! match the register's active-low polarity. The select bits written to
//! FF00 pick which nibble is visible; pressing a button in a selected
//! group raises the joypad interrupt on the held edge.

use crate::interrupts::{Interrupt, Interrupts};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    fn bit(self) -> u8 {
        match self {
            Button::Right => 0,
            Button::Left => 1,
            Button::Up => 2,
            Button::Down => 3,
            Button::A => 4,
            Button::B => 5,
            Button::Select => 6,
            Button::Start => 7,
        }
    }

    fn is_direction(self) -> bool {
        self.bit() < 4
    }

    /// The direction that cannot be held at the same time as this one.
    fn opposite(self) -> Option<Button> {
        match self {
            Button::Right => Some(Button::Left),
            Button::Left => Some(Button::Right),
            Button::Up => Some(Button::Down),
            Button::Down => Some(Button::Up),
            _ => None,
        }
    }
}

pub struct Joypad {
    gates: u8, // clear = held
    joyp: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            gates: 0xFF,
            joyp: 0xCF,
        }
    }

    pub fn press(&mut self, button: Button, ints: &mut Interrupts) {
        if let Some(opposite) = button.opposite() {
            if self.gates & (1 << opposite.bit()) == 0 {
                return;
            }
        }

        let mask = 1 << button.bit();
        let newly_pressed = self.gates & mask != 0;
        self.gates &= !mask;

        let group_selected = if button.is_direction() {
            self.joyp & 0x10 == 0
        } else {
            self.joyp & 0x20 == 0
        };
        if newly_pressed && group_selected {
            ints.set(Interrupt::Joypad);
        }
    }

    pub fn release(&mut self, button: Button) {
        self.gates |= 1 << button.bit();
    }

    pub fn read(&self) -> u8 {
        let buttons = self.gates >> 4;
        let directions = self.gates & 0x0F;
        let nibble = match (self.joyp >> 4) & 0x03 {
            0x00 => buttons & directions,
            0x01 => buttons,
            0x02 => directions,
            _ => 0x0F,
        };
        0xC0 | (self.joyp & 0x30) | nibble
    }

    /// Only the two select bits are writable.
    pub fn write(&mut self, val: u8) {
        self.joyp = (self.joyp & 0xCF) | (val & 0x30);
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}
