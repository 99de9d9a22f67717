//! Device channel — transport trait + nusb backend.
//!
//! The protocol engine only needs claim/open plus the two class control
//! transfer primitives, so that is the whole trait surface. [`UsbChannel`]
//! is the real transport; tests drive the engine through scripted channels.

use crate::command::Request;
use crate::constants::{CONFIGURATION, INTERFACE, VENDOR_ID};
use crate::error::Error;
use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient};
use nusb::{DeviceInfo, Interface};
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for a single control transfer.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(1);

/// Transport carrying DFU class control transfers to one claimed device.
#[allow(async_fn_in_trait)]
pub trait Channel {
    /// Selects a bootloader device and claims its DFU interface,
    /// scanning or prompting as the transport requires.
    async fn pair() -> Result<Self, Error>
    where
        Self: Sized;

    /// Claims the first already-authorized device without a new scan prompt.
    async fn connect() -> Result<Self, Error>
    where
        Self: Sized;

    /// Class control transfer to the interface (host → device).
    async fn control_out(&self, request: Request, value: u16, data: &[u8]) -> Result<(), Error>;

    /// Class control transfer from the interface (device → host),
    /// requesting up to `length` bytes.
    async fn control_in(&self, request: Request, value: u16, length: u16) -> Result<Vec<u8>, Error>;
}

/// nusb-backed channel: configuration 1, interface 0 of the first device
/// matching the Atmel vendor ID.
pub struct UsbChannel {
    interface: Interface,
    interface_number: u16,
}

impl UsbChannel {
    async fn find_device() -> Result<DeviceInfo, Error> {
        info!("searching for DFU bootloader (vendor 0x{VENDOR_ID:04X})...");
        let device_info = nusb::list_devices()
            .await?
            .into_iter()
            .find(|d| d.vendor_id() == VENDOR_ID)
            .ok_or(Error::DeviceNotFound)?;
        info!(
            "found device 0x{:04X}:0x{:04X}",
            device_info.vendor_id(),
            device_info.product_id()
        );
        Ok(device_info)
    }

    async fn open(device_info: DeviceInfo) -> Result<Self, Error> {
        let device = device_info.open().await?;
        device.set_configuration(CONFIGURATION).await?;
        let interface = device.detach_and_claim_interface(INTERFACE).await?;
        info!("interface {INTERFACE} claimed");
        Ok(Self {
            interface,
            interface_number: INTERFACE as u16,
        })
    }
}

impl Channel for UsbChannel {
    /// Scans for a bootloader and claims it — the native stand-in for the
    /// browser permission prompt.
    async fn pair() -> Result<Self, Error> {
        let device_info = Self::find_device().await?;
        Self::open(device_info).await
    }

    /// Native hosts keep no authorization list, so the first enumerated
    /// match is the previously authorized device.
    async fn connect() -> Result<Self, Error> {
        let device_info = Self::find_device().await?;
        Self::open(device_info).await
    }

    async fn control_out(&self, request: Request, value: u16, data: &[u8]) -> Result<(), Error> {
        debug!(?request, value, len = data.len(), "control out");
        self.interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Class,
                    recipient: Recipient::Interface,
                    request: request.into(),
                    value,
                    index: self.interface_number,
                    data,
                },
                TRANSFER_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    async fn control_in(&self, request: Request, value: u16, length: u16) -> Result<Vec<u8>, Error> {
        let data = self
            .interface
            .control_in(
                ControlIn {
                    control_type: ControlType::Class,
                    recipient: Recipient::Interface,
                    request: request.into(),
                    value,
                    index: self.interface_number,
                    length,
                },
                TRANSFER_TIMEOUT,
            )
            .await?;
        debug!(?request, len = data.len(), "control in");
        Ok(data)
    }
}
