//! Host-side driver for the Atmel AVR USB DFU bootloader.
//!
//! The bootloader is driven entirely over USB control transfers: commands go
//! out via `DFU_DNLOAD`, results come back via `DFU_UPLOAD` and
//! `DFU_GETSTATUS`. This crate provides the command catalog, the firmware
//! image format, the status/state decoding and a session object that
//! sequences a full erase → download → manifest → reset cycle.

pub mod channel;
pub mod command;
pub mod constants;
pub mod device;
pub mod error;
pub mod image;
pub mod status;


pub use channel::{Channel, UsbChannel};
pub use command::{ReadCommand, Request};
pub use device::Dfu;
pub use error::Error;
pub use status::{StateCode, Status, StatusCode};
