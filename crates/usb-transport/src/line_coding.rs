//! CDC line coding (baud rate, framing)

use crate::error::TransportError;
use serde::{Deserialize, Serialize};

/// Stop bit setting (`bCharFormat`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

/// Parity setting (`bParityType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    Mark,
    Space,
}

/// Line coding as exchanged by SET/GET_LINE_CODING.
///
/// The device stores and reports it without interpreting it; USB bulk
/// transfers are not paced by a baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineCoding {
    pub baud_rate: u32,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub data_bits: u8,
}

impl LineCoding {
    /// Size of the wire form
    pub const WIRE_LEN: usize = 7;

    /// Encode as `dwDTERate` (LE u32), `bCharFormat`, `bParityType`, `bDataBits`
    pub fn to_bytes(&self) -> [u8; Self::WIRE_LEN] {
        let rate = self.baud_rate.to_le_bytes();
        let stop = match self.stop_bits {
            StopBits::One => 0,
            StopBits::OnePointFive => 1,
            StopBits::Two => 2,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Odd => 1,
            Parity::Even => 2,
            Parity::Mark => 3,
            Parity::Space => 4,
        };
        [rate[0], rate[1], rate[2], rate[3], stop, parity, self.data_bits]
    }

    /// Decode the 7-byte wire form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        let bytes: &[u8; Self::WIRE_LEN] = bytes.try_into().map_err(|_| {
            TransportError::InvalidLineCoding(format!("expected 7 bytes, got {}", bytes.len()))
        })?;

        let stop_bits = match bytes[4] {
            0 => StopBits::One,
            1 => StopBits::OnePointFive,
            2 => StopBits::Two,
            other => {
                return Err(TransportError::InvalidLineCoding(format!(
                    "stop bits code {other}"
                )))
            }
        };
        let parity = match bytes[5] {
            0 => Parity::None,
            1 => Parity::Odd,
            2 => Parity::Even,
            3 => Parity::Mark,
            4 => Parity::Space,
            other => {
                return Err(TransportError::InvalidLineCoding(format!(
                    "parity code {other}"
                )))
            }
        };
        let data_bits = bytes[6];
        if !matches!(data_bits, 5 | 6 | 7 | 8 | 16) {
            return Err(TransportError::InvalidLineCoding(format!(
                "data bits {data_bits}"
            )));
        }

        Ok(Self {
            baud_rate: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            stop_bits,
            parity,
            data_bits,
        })
    }

    /// Serial port builder for the host side
    pub fn port_builder(&self, path: &str) -> Result<tokio_serial::SerialPortBuilder, TransportError> {
        let data_bits = match self.data_bits {
            5 => tokio_serial::DataBits::Five,
            6 => tokio_serial::DataBits::Six,
            7 => tokio_serial::DataBits::Seven,
            8 => tokio_serial::DataBits::Eight,
            other => {
                return Err(TransportError::InvalidLineCoding(format!(
                    "host serial ports do not support {other} data bits"
                )))
            }
        };
        let parity = match self.parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
            Parity::Mark | Parity::Space => {
                return Err(TransportError::InvalidLineCoding(
                    "mark/space parity is not supported by the host driver".to_string(),
                ))
            }
        };
        let stop_bits = match self.stop_bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
            StopBits::OnePointFive => {
                return Err(TransportError::InvalidLineCoding(
                    "1.5 stop bits is not supported by the host driver".to_string(),
                ))
            }
        };

        Ok(tokio_serial::new(path, self.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits))
    }
}

impl Default for LineCoding {
    fn default() -> Self {
        Self {
            baud_rate: 38400,
            stop_bits: StopBits::One,
            parity: Parity::None,
            data_bits: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_wire_form() {
        // 38400 = 0x9600
        assert_eq!(
            LineCoding::default().to_bytes(),
            [0x00, 0x96, 0x00, 0x00, 0, 0, 8]
        );
    }

    #[test]
    fn test_decode() {
        let coding = LineCoding::from_bytes(&[0x00, 0xC2, 0x01, 0x00, 2, 2, 7]).unwrap();
        assert_eq!(coding.baud_rate, 115_200);
        assert_eq!(coding.stop_bits, StopBits::Two);
        assert_eq!(coding.parity, Parity::Even);
        assert_eq!(coding.data_bits, 7);
        assert_eq!(LineCoding::from_bytes(&coding.to_bytes()).unwrap(), coding);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(LineCoding::from_bytes(&[0; 6]).is_err());
        assert!(LineCoding::from_bytes(&[0, 0, 0, 0, 3, 0, 8]).is_err());
        assert!(LineCoding::from_bytes(&[0, 0, 0, 0, 0, 5, 8]).is_err());
        assert!(LineCoding::from_bytes(&[0, 0, 0, 0, 0, 0, 9]).is_err());
    }

    #[test]
    fn test_port_builder_rejects_unsupported() {
        let coding = LineCoding {
            stop_bits: StopBits::OnePointFive,
            ..Default::default()
        };
        assert!(coding.port_builder("/dev/null").is_err());
        assert!(LineCoding::default().port_builder("/dev/null").is_ok());
    }
}
