use std::time::Duration;

use rppal::i2c::I2c;
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::wait_until_ready;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

/// Start a single conversion.
const OS_START: u16 = 1 << 15;
/// AIN0 against GND.
const MUX_AIN0_GND: u16 = 0b100 << 12;
/// Gain 1, full scale +/-4.096 V.
const PGA_4_096V: u16 = 0b001 << 9;
const MODE_SINGLE_SHOT: u16 = 1 << 8;
/// 128 samples per second.
const DR_128SPS: u16 = 0b100 << 5;
/// Comparator disabled.
const COMP_QUE_DISABLE: u16 = 0b11;

const SINGLE_SHOT_AIN0: u16 =
    OS_START | MUX_AIN0_GND | PGA_4_096V | MODE_SINGLE_SHOT | DR_128SPS | COMP_QUE_DISABLE;

pub struct Ads1115 {
    i2c: I2c,
    conversion_timeout: Duration,
}

impl Ads1115 {
    pub fn open(bus: u8, address: u16, conversion_timeout: Duration) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(format!("open bus {bus}: {e}")))?;
        i2c.set_slave_address(address)
            .map_err(|e| HwError::I2c(format!("address {address:#04x}: {e}")))?;
        Ok(Self {
            i2c,
            conversion_timeout,
        })
    }

    fn read_register(&self, reg: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(&[reg], &mut buf)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(u16::from_be_bytes(buf))
    }

    /// One single-shot conversion on AIN0.
    pub fn read_single(&self) -> Result<i16> {
        let [hi, lo] = SINGLE_SHOT_AIN0.to_be_bytes();
        self.i2c
            .write(&[REG_CONFIG, hi, lo])
            .map_err(|e| HwError::I2c(e.to_string()))?;

        // OS reads back as 1 once the device is idle again
        wait_until_ready(
            || Ok((self.read_register(REG_CONFIG)? & OS_START) != 0),
            self.conversion_timeout,
            Duration::from_millis(1),
        )?;

        let raw = i16::from_be_bytes(self.read_register(REG_CONVERSION)?.to_be_bytes());
        trace!(raw, "ads1115 conversion");
        Ok(raw)
    }
}
