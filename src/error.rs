use thiserror::Error;

/// The primary error type for the `avrdfu` library.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no device selected, pair() or connect() first")]
    DeviceNotSelected,

    #[error("device not connected")]
    DeviceNotConnected,

    #[error("no DFU bootloader found (vendor 0x03EB). Is the device in bootloader mode?")]
    DeviceNotFound,

    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    #[error("control transfer failed: {0}")]
    Transfer(#[from] nusb::transfer::TransferError),

    #[error("no response from bootloader")]
    NoResponse,

    #[error("unknown DFU status code 0x{0:02X}")]
    UnknownStatusCode(u8),

    #[error("unknown DFU state code 0x{0:02X}")]
    UnknownStateCode(u8),

    #[error("firmware length {0} outside 1..=65536")]
    InvalidFirmwareLength(usize),
}
