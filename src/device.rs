//! Protocol engine — drives the bootloader through a [`Channel`].
//!
//! One session owns at most one device handle, and every operation takes
//! `&mut self`, so at most one control transfer is ever in flight. The
//! bootloader's own state machine follows USB-DFU semantics; its reported
//! state comes back as data, not as an engine error — a `dfuERROR` device
//! is still a healthy session, recoverable via [`Dfu::clear_status`].

use crate::channel::Channel;
use crate::command::{self, ReadCommand, Request};
use crate::constants::{STATE_SIZE, STATUS_SIZE};
use crate::error::Error;
use crate::image;
use crate::status::{StateCode, Status};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Buffered status events per subscriber; a lagging UI drops the oldest.
const STATUS_EVENT_CAPACITY: usize = 16;

/// Session lifecycle: the handle is absent until `pair`/`connect`, and
/// cleared again by `restart`/`disconnect`.
enum Link<C> {
    Unpaired,
    Connected(C),
    Disconnected,
}

/// A DFU session over one exclusively-owned device handle.
pub struct Dfu<C: Channel> {
    link: Link<C>,
    status_tx: broadcast::Sender<Status>,
    /// Earliest instant the next status poll may be issued, derived from
    /// the last decoded `bwPollTimeOut`.
    next_poll: Option<Instant>,
}

impl<C: Channel> Dfu<C> {
    pub fn new() -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_EVENT_CAPACITY);
        Self {
            link: Link::Unpaired,
            status_tx,
            next_poll: None,
        }
    }

    /// Wraps an already-claimed channel. For custom transports and tests;
    /// `pair`/`connect` cover the usual USB path.
    pub fn with_channel(channel: C) -> Self {
        let mut dfu = Self::new();
        dfu.link = Link::Connected(channel);
        dfu
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.link, Link::Connected(_))
    }

    /// Subscribes to decoded status updates. Every successful
    /// [`get_status`](Self::get_status) is broadcast to all subscribers.
    pub fn subscribe(&self) -> broadcast::Receiver<Status> {
        self.status_tx.subscribe()
    }

    /// Selects and claims a new bootloader device.
    ///
    /// Failures are reported (`false`) rather than propagated; a failed
    /// pair leaves no handle behind.
    pub async fn pair(&mut self) -> bool {
        match C::pair().await {
            Ok(channel) => {
                info!("device paired");
                self.link = Link::Connected(channel);
                true
            }
            Err(e) => {
                error!("pairing failed: {e}");
                self.clear_link();
                false
            }
        }
    }

    /// Reclaims the first previously authorized device, without a new
    /// selection prompt. Same failure contract as [`pair`](Self::pair).
    pub async fn connect(&mut self) -> bool {
        match C::connect().await {
            Ok(channel) => {
                info!("device connected");
                self.link = Link::Connected(channel);
                true
            }
            Err(e) => {
                error!("connecting failed: {e}");
                self.clear_link();
                false
            }
        }
    }

    /// Releases the device handle. Subsequent operations fail with
    /// [`Error::DeviceNotConnected`] until `pair` or `connect`.
    pub fn disconnect(&mut self) {
        if self.is_connected() {
            info!("device disconnected");
        }
        self.clear_link();
    }

    /// Low-level `DFU_DNLOAD` (wValue 0) carrying a command or image.
    pub async fn send(&mut self, data: &[u8]) -> Result<(), Error> {
        self.channel()?.control_out(Request::Dnload, 0, data).await
    }

    /// Builds the flashable image and downloads it, then polls status once
    /// to complete the block. The caller is responsible for erasing first
    /// where the target requires it.
    pub async fn download(&mut self, firmware: &[u8]) -> Result<Status, Error> {
        info!("downloading firmware, {} bytes", firmware.len());
        let image = image::build(firmware, 0)?;
        self.send(&image).await?;
        let status = self.get_status().await?;
        info!("download complete: {status}");
        Ok(status)
    }

    /// Full chip erase.
    pub async fn erase(&mut self) -> Result<(), Error> {
        info!("sending full chip erase");
        self.send(&command::ERASE).await
    }

    /// Reads one configuration or signature field: command download,
    /// status poll, then a one-byte upload with the field value.
    pub async fn read(&mut self, field: ReadCommand) -> Result<u8, Error> {
        info!("reading {}", field.describe());
        self.send(&field.bytes()).await?;
        self.get_status().await?;
        let data = self.channel()?.control_in(Request::Upload, 0, 1).await?;
        data.first().copied().ok_or(Error::NoResponse)
    }

    /// Queries the bootloader state via `DFU_GETSTATE`.
    pub async fn get_state(&mut self) -> Result<StateCode, Error> {
        let data = self
            .channel()?
            .control_in(Request::GetState, 0, STATE_SIZE as u16)
            .await?;
        let byte = data.first().copied().ok_or(Error::NoResponse)?;
        StateCode::decode(byte)
    }

    /// Queries and decodes `DFU_GETSTATUS`, emitting the result to all
    /// subscribers.
    ///
    /// The decoded `bwPollTimeOut` gates the next poll: a subsequent
    /// `get_status` waits out the advertised minimum delay instead of
    /// hammering the bootloader back-to-back.
    pub async fn get_status(&mut self) -> Result<Status, Error> {
        if let Some(deadline) = self.next_poll.take() {
            tokio::time::sleep_until(deadline).await;
        }
        let data = self
            .channel()?
            .control_in(Request::GetStatus, 0, STATUS_SIZE as u16)
            .await?;
        let status = Status::decode(&data)?;
        if status.poll_timeout_ms > 0 {
            self.next_poll =
                Some(Instant::now() + Duration::from_millis(u64::from(status.poll_timeout_ms)));
        }
        if status.state == StateCode::DfuError {
            warn!("bootloader reports {}: {}", status.state, status.status);
        }
        let _ = self.status_tx.send(status);
        Ok(status)
    }

    /// `DFU_ABORT`: returns the bootloader to dfuIDLE from the download
    /// and upload idle states.
    pub async fn abort(&mut self) -> Result<(), Error> {
        info!("sending DFU_ABORT");
        self.channel()?
            .control_out(Request::Abort, 0, &command::EMPTY)
            .await
    }

    /// `DFU_CLRSTATUS`: recovers the bootloader from dfuERROR.
    pub async fn clear_status(&mut self) -> Result<(), Error> {
        info!("sending DFU_CLRSTATUS");
        self.next_poll = None;
        self.channel()?
            .control_out(Request::ClrStatus, 0, &command::EMPTY)
            .await
    }

    /// Restarts into the application: the restart command followed by an
    /// empty download to trigger manifestation, then drops the handle.
    pub async fn restart(&mut self) -> Result<(), Error> {
        info!("restarting device");
        self.send(&command::RESTART).await?;
        self.send(&command::EMPTY).await?;
        self.clear_link();
        Ok(())
    }

    fn channel(&self) -> Result<&C, Error> {
        match &self.link {
            Link::Connected(channel) => Ok(channel),
            Link::Unpaired => Err(Error::DeviceNotSelected),
            Link::Disconnected => Err(Error::DeviceNotConnected),
        }
    }

    /// Drops the handle. A session that never paired stays `Unpaired` so
    /// it keeps failing with `DeviceNotSelected` rather than
    /// `DeviceNotConnected`.
    fn clear_link(&mut self) {
        if !matches!(self.link, Link::Unpaired) {
            self.link = Link::Disconnected;
        }
        self.next_poll = None;
    }
}

impl<C: Channel> Default for Dfu<C> {
    fn default() -> Self {
        Self::new()
    }
}
