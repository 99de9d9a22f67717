//! Decoding of `DFU_GETSTATUS` / `DFU_GETSTATE` responses.
//!
//! A status response is six bytes on the wire:
//! `[bStatus][pollTimeout0][pollTimeout1][pollTimeout2][bState][iString]`
//! with the poll timeout as a little-endian 24-bit millisecond count.
//! Unrecognized code bytes are decode errors, never silently defaulted.

use crate::constants::STATUS_SIZE;
use crate::error::Error;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// Result of the last bootloader operation (wire field `bStatus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum StatusCode {
    Ok = 0x00,
    ErrTarget = 0x01,
    ErrFile = 0x02,
    ErrWrite = 0x03,
    ErrErase = 0x04,
    ErrCheckErased = 0x05,
    ErrProg = 0x06,
    ErrVerify = 0x07,
    ErrAddress = 0x08,
    ErrNotDone = 0x09,
    ErrFirmware = 0x0A,
    ErrVendor = 0x0B,
    ErrUsbReset = 0x0C,
    ErrPowerOnReset = 0x0D,
    ErrUnknown = 0x0E,
    ErrStalledPacket = 0x0F,
}

impl StatusCode {
    /// One-line description, DFU 1.1 wording.
    pub const fn describe(self) -> &'static str {
        match self {
            StatusCode::Ok => "No error condition is present",
            StatusCode::ErrTarget => "File is not targeted for use by this device",
            StatusCode::ErrFile => "File fails a vendor-specific verification test",
            StatusCode::ErrWrite => "Device is unable to write memory",
            StatusCode::ErrErase => "Memory erase function failed",
            StatusCode::ErrCheckErased => "Memory erase check failed",
            StatusCode::ErrProg => "Program memory function failed",
            StatusCode::ErrVerify => "Programmed memory failed verification",
            StatusCode::ErrAddress => "Received address is out of range",
            StatusCode::ErrNotDone => "Received a zero-length download, but the device expects more data",
            StatusCode::ErrFirmware => "Firmware is corrupt, the device cannot return to run-time operation",
            StatusCode::ErrVendor => "iString indicates a vendor-specific error",
            StatusCode::ErrUsbReset => "Device detected an unexpected USB reset",
            StatusCode::ErrPowerOnReset => "Device detected an unexpected power-on reset",
            StatusCode::ErrUnknown => "Something went wrong, but the device does not know what",
            StatusCode::ErrStalledPacket => "Device stalled an unexpected request",
        }
    }

    /// Decodes a raw `bStatus` byte.
    pub fn decode(byte: u8) -> Result<Self, Error> {
        Self::try_from(byte).map_err(|_| Error::UnknownStatusCode(byte))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Bootloader lifecycle state (wire field `bState`), USB-DFU semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum StateCode {
    AppIdle = 0x00,
    AppDetach = 0x01,
    DfuIdle = 0x02,
    DfuDnloadSync = 0x03,
    DfuDnbusy = 0x04,
    DfuDnloadIdle = 0x05,
    DfuManifestSync = 0x06,
    DfuManifest = 0x07,
    DfuManifestWaitReset = 0x08,
    DfuUploadIdle = 0x09,
    DfuError = 0x0A,
}

impl StateCode {
    /// One-line description, DFU 1.1 wording.
    pub const fn describe(self) -> &'static str {
        match self {
            StateCode::AppIdle => "Device is running its normal application",
            StateCode::AppDetach => "Device received DFU_DETACH and is waiting for a USB reset",
            StateCode::DfuIdle => "Device is in DFU mode, waiting for requests",
            StateCode::DfuDnloadSync => "Device received a block and is waiting for DFU_GETSTATUS",
            StateCode::DfuDnbusy => "Device is programming a memory block",
            StateCode::DfuDnloadIdle => "Device is processing a download, expecting DFU_DNLOAD",
            StateCode::DfuManifestSync => "Device received the final block, waiting for DFU_GETSTATUS to manifest",
            StateCode::DfuManifest => "Device is in the manifestation phase",
            StateCode::DfuManifestWaitReset => "Device has programmed its memory and is waiting for a reset",
            StateCode::DfuUploadIdle => "Device is processing an upload, expecting DFU_UPLOAD",
            StateCode::DfuError => "An error occurred, awaiting DFU_CLRSTATUS",
        }
    }

    /// Decodes a raw `bState` byte.
    pub fn decode(byte: u8) -> Result<Self, Error> {
        Self::try_from(byte).map_err(|_| Error::UnknownStateCode(byte))
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Decoded `DFU_GETSTATUS` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Result of the last operation (`bStatus`).
    pub status: StatusCode,
    /// Minimum wait in milliseconds before the next status poll
    /// (`bwPollTimeOut`, 24 bits on the wire).
    pub poll_timeout_ms: u32,
    /// Current bootloader state (`bState`).
    pub state: StateCode,
    /// Index of a vendor status description string (`iString`).
    pub istring: u8,
}

impl Status {
    /// Decodes a raw 6-byte status response.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < STATUS_SIZE {
            return Err(Error::NoResponse);
        }
        Ok(Status {
            status: StatusCode::decode(bytes[0])?,
            poll_timeout_ms: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], 0]),
            state: StateCode::decode(bytes[4])?,
            istring: bytes[5],
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} ({:?}), poll in {} ms",
            self.status, self.state, self.poll_timeout_ms
        )
    }
}
