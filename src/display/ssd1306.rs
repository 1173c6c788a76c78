//! Minimal SSD1306 (128x64) driver over any `embedded-hal` 1.0 I²C bus.
//!
//! The panel runs in horizontal addressing mode; every flush rewrites the
//! whole 1024-byte GDDRAM so the frame buffer layout maps one-to-one.

use color_eyre::Result;
use color_eyre::eyre::eyre;
use embedded_hal::i2c::{Error as _, I2c};

use super::DisplaySink;
use crate::render::frame::{BUFFER_LEN, Frame, WIDTH};

// Control bytes
const CMD: u8 = 0x00;
const DATA: u8 = 0x40;

// Commands
const DISPLAY_OFF: u8 = 0xAE;
const DISPLAY_ON: u8 = 0xAF;
const SET_CLOCK_DIV: u8 = 0xD5;
const SET_MULTIPLEX: u8 = 0xA8;
const SET_DISPLAY_OFFSET: u8 = 0xD3;
const SET_START_LINE: u8 = 0x40;
const CHARGE_PUMP: u8 = 0x8D;
const MEMORY_MODE: u8 = 0x20;
const SEG_REMAP_OFF: u8 = 0xA0;
const SEG_REMAP_ON: u8 = 0xA1;
const COM_SCAN_INC: u8 = 0xC0;
const COM_SCAN_DEC: u8 = 0xC8;
const SET_COM_PINS: u8 = 0xDA;
const SET_CONTRAST: u8 = 0x81;
const SET_PRECHARGE: u8 = 0xD9;
const SET_VCOM_DETECT: u8 = 0xDB;
const RESUME_RAM: u8 = 0xA4;
const NORMAL_DISPLAY: u8 = 0xA6;
const COLUMN_ADDR: u8 = 0x21;
const PAGE_ADDR: u8 = 0x22;

/// Data bytes per I²C write, excluding the control byte.
const CHUNK: usize = 128;

pub struct Ssd1306<I2C: I2c> {
    i2c: I2C,
    address: u8,
    powered: bool,
}

impl<I2C: I2c> Ssd1306<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Ssd1306 {
            i2c,
            address,
            powered: false,
        }
    }

    /// Power-on sequence for the internal charge pump variant, then a blank frame.
    pub fn init(&mut self, contrast: u8, rotate_180: bool) -> Result<()> {
        // Default mounting is mirrored on both axes, 180° undoes it.
        let (seg_remap, com_scan) = if rotate_180 {
            (SEG_REMAP_OFF, COM_SCAN_INC)
        } else {
            (SEG_REMAP_ON, COM_SCAN_DEC)
        };
        self.commands(&[
            DISPLAY_OFF,
            SET_CLOCK_DIV,
            0x80,
            SET_MULTIPLEX,
            0x3F,
            SET_DISPLAY_OFFSET,
            0x00,
            SET_START_LINE,
            CHARGE_PUMP,
            0x14,
            MEMORY_MODE,
            0x00,
            seg_remap,
            com_scan,
            SET_COM_PINS,
            0x12,
            SET_CONTRAST,
            contrast,
            SET_PRECHARGE,
            0xF1,
            SET_VCOM_DETECT,
            0x40,
            RESUME_RAM,
            NORMAL_DISPLAY,
        ])?;
        self.flush(&Frame::new())?;
        self.commands(&[DISPLAY_ON])?;
        self.powered = true;
        tracing::info!(address = format_args!("{:#04x}", self.address), contrast, rotate_180, "ssd1306 ready");
        Ok(())
    }

    pub fn flush(&mut self, frame: &Frame) -> Result<()> {
        self.commands(&[COLUMN_ADDR, 0, (WIDTH - 1) as u8, PAGE_ADDR, 0, 7])?;
        let mut packet = [0u8; CHUNK + 1];
        packet[0] = DATA;
        for chunk in frame.as_bytes().chunks(CHUNK) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            self.write(&packet[..=chunk.len()])?;
        }
        Ok(())
    }

    /// Blank the panel and switch it off.
    pub fn power_off(&mut self) -> Result<()> {
        self.flush(&Frame::new())?;
        self.commands(&[DISPLAY_OFF])?;
        self.powered = false;
        Ok(())
    }

    fn commands(&mut self, commands: &[u8]) -> Result<()> {
        let mut packet = Vec::with_capacity(commands.len() + 1);
        packet.push(CMD);
        packet.extend_from_slice(commands);
        self.write(&packet)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.i2c
            .write(self.address, bytes)
            .map_err(|err| eyre!("i2c write to {:#04x} failed: {:?}", self.address, err.kind()))
    }
}

const _: () = assert!(BUFFER_LEN % CHUNK == 0);

impl<I2C: I2c> DisplaySink for Ssd1306<I2C> {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        self.flush(frame)
    }
}

impl<I2C: I2c> Drop for Ssd1306<I2C> {
    fn drop(&mut self) {
        if !self.powered {
            return;
        }
        match self.power_off() {
            Ok(()) => tracing::debug!("ssd1306 powered off"),
            Err(err) => tracing::warn!(%err, "could not power off display"),
        }
    }
}
