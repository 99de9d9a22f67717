//! Command catalog for the AVR DFU bootloader.
//!
//! Every exchange is a class control transfer selected by a [`Request`]
//! code. Commands themselves travel as `DFU_DNLOAD` payloads built from a
//! one-byte [`CommandId`] plus command-specific bytes; the tables below are
//! part of the wire contract and must match the bootloader exactly.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// bRequest codes of the DFU class control requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Request {
    Detach = 0x00,
    Dnload = 0x01,
    Upload = 0x02,
    GetStatus = 0x03,
    ClrStatus = 0x04,
    GetState = 0x05,
    Abort = 0x06,
}

/// First byte of every `DFU_DNLOAD` command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CommandId {
    ProgramStart = 0x01,
    DisplayData = 0x03,
    WriteCommand = 0x04,
    ReadCommand = 0x05,
    ChangeBaseAddress = 0x06,
}

/// Zero-length download, used to leave command mode.
pub const EMPTY: [u8; 0] = [];

/// Full chip erase.
pub const ERASE: [u8; 6] = [CommandId::WriteCommand as u8, 0x00, 0xFF, 0x00, 0x00, 0x00];

/// Start the application (hardware reset on manifestation).
pub const RESTART: [u8; 6] = [CommandId::WriteCommand as u8, 0x03, 0x01, 0x00, 0x00, 0x00];

/// Readable one-byte configuration and signature fields.
///
/// Each maps to a two-byte field address sent after the
/// [`CommandId::ReadCommand`] identifier. The set is open on the wire:
/// bootloader revisions expose further fields, which is why
/// [`describe_read_command`] falls back to a generic label instead of
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadCommand {
    BootloaderVersion,
    BootId1,
    BootId2,
    ManufacturerCode,
    FamilyCode,
    ProductName,
    ProductRevision,
}

impl ReadCommand {
    /// Field address (group, index) within the bootloader's read space.
    pub const fn field_address(self) -> [u8; 2] {
        match self {
            ReadCommand::BootloaderVersion => [0x00, 0x00],
            ReadCommand::BootId1 => [0x00, 0x01],
            ReadCommand::BootId2 => [0x00, 0x02],
            ReadCommand::ManufacturerCode => [0x01, 0x30],
            ReadCommand::FamilyCode => [0x01, 0x31],
            ReadCommand::ProductName => [0x01, 0x60],
            ReadCommand::ProductRevision => [0x01, 0x61],
        }
    }

    /// Full command bytes as sent via `DFU_DNLOAD`.
    pub const fn bytes(self) -> [u8; 3] {
        let [group, index] = self.field_address();
        [CommandId::ReadCommand as u8, group, index]
    }

    pub const fn describe(self) -> &'static str {
        match self {
            ReadCommand::BootloaderVersion => "Bootloader version",
            ReadCommand::BootId1 => "Boot ID 1",
            ReadCommand::BootId2 => "Boot ID 2",
            ReadCommand::ManufacturerCode => "Manufacturer code",
            ReadCommand::FamilyCode => "Family code",
            ReadCommand::ProductName => "Product name",
            ReadCommand::ProductRevision => "Product revision",
        }
    }
}

/// Describes raw read-command bytes.
///
/// Unlike the status and state decoders this never fails: read commands are
/// an open set, so an unrecognized field address gets a generic label.
pub fn describe_read_command(command: &[u8]) -> &'static str {
    const READ_COMMANDS: [ReadCommand; 7] = [
        ReadCommand::BootloaderVersion,
        ReadCommand::BootId1,
        ReadCommand::BootId2,
        ReadCommand::ManufacturerCode,
        ReadCommand::FamilyCode,
        ReadCommand::ProductName,
        ReadCommand::ProductRevision,
    ];
    READ_COMMANDS
        .iter()
        .find(|read| read.bytes() == *command)
        .map(|read| read.describe())
        .unwrap_or("Unknown field")
}
