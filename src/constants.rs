// Wire constants for the AVR DFU bootloader

/// Atmel vendor ID, used to select the bootloader device
pub const VENDOR_ID: u16 = 0x03EB;

/// USB configuration hosting the DFU interface
pub const CONFIGURATION: u8 = 1;

/// DFU interface number, also sent as wIndex on every control transfer
pub const INTERFACE: u8 = 0;

/// Size of the firmware image header (6 meaningful bytes, zero padded)
pub const HEADER_SIZE: usize = 32;

/// Size of the fixed firmware image trailer
pub const SUFFIX_SIZE: usize = 16;

/// Largest firmware payload the 16-bit header length field can describe
pub const MAX_FIRMWARE_SIZE: usize = 0x1_0000;

/// Fixed image trailer: zero padding, "DFU" signature, spec revision 1.10
/// and a placeholder CRC. The bootloader accepts it verbatim; it never
/// varies with the payload.
pub const SUFFIX: [u8; SUFFIX_SIZE] = [
    0x00, 0x00, 0x00, 0x00, // trailing zeros
    0x10, 0x44, 0x46, 0x55, // bcdDFU 1.10 + "DFU" signature
    0x01, 0x10, // bcdDevice
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // placeholder CRC
];

/// Wire size of a DFU_GETSTATUS response
pub const STATUS_SIZE: usize = 6;

/// Wire size of a DFU_GETSTATE response
pub const STATE_SIZE: usize = 1;
