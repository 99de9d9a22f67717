//! Firmware image builder.
//!
//! The bootloader accepts firmware as a single download of
//! `32 + len + 16` bytes: a mostly-zero 32-byte header carrying the
//! program-start opcode, start address and length, the raw payload, and the
//! fixed [`SUFFIX`] trailer.

use crate::command::CommandId;
use crate::constants::{HEADER_SIZE, MAX_FIRMWARE_SIZE, SUFFIX, SUFFIX_SIZE};
use crate::error::Error;

/// Builds a flashable image from a raw firmware payload.
///
/// Pure function: the output length and bytes are fully determined by the
/// inputs. The header length field is 16 bits wide, so payloads of length 0
/// or above 65536 are rejected with [`Error::InvalidFirmwareLength`] instead
/// of wrapping into a corrupt header.
pub fn build(firmware: &[u8], start_address: u16) -> Result<Vec<u8>, Error> {
    let len = firmware.len();
    if len == 0 || len > MAX_FIRMWARE_SIZE {
        return Err(Error::InvalidFirmwareLength(len));
    }

    let mut image = vec![0u8; HEADER_SIZE + len + SUFFIX_SIZE];

    // Header: opcode, zero, start address and length - 1, both big-endian.
    image[0] = CommandId::ProgramStart as u8;
    image[1] = 0x00;
    image[2..4].copy_from_slice(&start_address.to_be_bytes());
    image[4..6].copy_from_slice(&((len - 1) as u16).to_be_bytes());

    image[HEADER_SIZE..HEADER_SIZE + len].copy_from_slice(firmware);
    image[HEADER_SIZE + len..].copy_from_slice(&SUFFIX);

    Ok(image)
}
