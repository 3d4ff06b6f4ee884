//! Serial port (SB/SC).
//!
//! No link cable is modeled. A transfer started with the internal clock
//! (SC = 0x81) completes immediately: the outgoing byte lands in a capture
//! buffer and the serial interrupt is raised. Test ROMs report their results
//! over this port, so the buffer doubles as a diagnostic stream.

use crate::interrupts::{Interrupt, Interrupts};

pub struct Serial {
    sb: u8,
    sc: u8,
    out_buf: Vec<u8>,
}

impl Serial {
    pub fn new() -> Self {
        Self {
            sb: 0x00,
            sc: 0x7E,
            out_buf: Vec::new(),
        }
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            0xFF01 => self.sb,
            0xFF02 => self.sc,
            _ => 0xFF,
        }
    }

    pub fn write_reg(&mut self, addr: u16, val: u8, ints: &mut Interrupts) {
        match addr {
            0xFF01 => self.sb = val,
            0xFF02 => {
                if val == 0x81 {
                    self.out_buf.push(self.sb);
                    self.sc = val & 0x7F;
                    ints.set(Interrupt::Serial);
                } else {
                    self.sc = val;
                }
            }
            _ => {}
        }
    }

    /// Drains the captured transfer bytes.
    pub fn take_output(&mut self) -> Vec<u8> {
        let out = self.out_buf.clone();
        self.out_buf.clear();
        out
    }

    pub fn peek_output(&self) -> &[u8] {
        &self.out_buf
    }
}

impl Default for Serial {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_start_captures_byte() {
        let mut serial = Serial::new();
        let mut ints = Interrupts::new();
        ints.write_flagged(0x00);

        serial.write_reg(0xFF01, b'X', &mut ints);
        serial.write_reg(0xFF02, 0x81, &mut ints);

        assert_eq!(serial.peek_output(), b"X");
        assert_eq!(serial.read_reg(0xFF02), 0x01);
        assert_ne!(ints.flagged() & 0x08, 0);
    }

    #[test]
    fn non_trigger_writes_capture_nothing() {
        let mut serial = Serial::new();
        let mut ints = Interrupts::new();
        ints.write_flagged(0x00);

        serial.write_reg(0xFF01, 0x42, &mut ints);
        serial.write_reg(0xFF02, 0x80, &mut ints);
        serial.write_reg(0xFF02, 0x01, &mut ints);

        assert!(serial.peek_output().is_empty());
        assert_eq!(ints.flagged() & 0x08, 0);
        assert_eq!(serial.read_reg(0xFF02), 0x01);
    }

    #[test]
    fn take_output_drains_the_buffer() {
        let mut serial = Serial::new();
        let mut ints = Interrupts::new();

        for b in b"Passed" {
            serial.write_reg(0xFF01, *b, &mut ints);
            serial.write_reg(0xFF02, 0x81, &mut ints);
        }
        assert_eq!(serial.take_output(), b"Passed");
        assert!(serial.take_output().is_empty());
    }

    #[test]
    fn power_on_values() {
        let serial = Serial::new();
        assert_eq!(serial.read_reg(0xFF01), 0x00);
        assert_eq!(serial.read_reg(0xFF02), 0x7E);
    }
}
