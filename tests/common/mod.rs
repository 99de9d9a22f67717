//! Common test utilities: a scripted channel that records the transfer log.

#[allow(unused_imports)]
pub use avrdfu::command::Request;
use avrdfu::{Channel, Error};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A status response with no poll timeout, state dfuDNLOAD_IDLE.
#[allow(dead_code)]
pub const STATUS_DNLOAD_IDLE: [u8; 6] = [0x00, 0x00, 0x00, 0x00, 0x05, 0x00];

/// A status response with a 10 ms poll timeout, state dfuIDLE.
#[allow(dead_code)]
pub const STATUS_IDLE: [u8; 6] = [0x00, 0x0A, 0x00, 0x00, 0x02, 0x00];

/// One recorded control transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum Transfer {
    Out {
        request: Request,
        value: u16,
        data: Vec<u8>,
    },
    In {
        request: Request,
        value: u16,
        length: u16,
    },
}

/// Scripted transport: records every transfer and answers control-in
/// requests from a queue of canned responses. An exhausted queue answers
/// with [`Error::NoResponse`].
#[derive(Default)]
pub struct MockChannel {
    pub log: Arc<Mutex<Vec<Transfer>>>,
    pub in_responses: Arc<Mutex<VecDeque<Result<Vec<u8>, Error>>>>,
}

#[allow(dead_code)]
impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a control-in response.
    pub fn push_in(&self, bytes: &[u8]) {
        self.in_responses
            .lock()
            .unwrap()
            .push_back(Ok(bytes.to_vec()));
    }

    /// Queues a control-in failure.
    pub fn push_in_error(&self, err: Error) {
        self.in_responses.lock().unwrap().push_back(Err(err));
    }

    /// Snapshot of the transfer log.
    pub fn transfers(log: &Arc<Mutex<Vec<Transfer>>>) -> Vec<Transfer> {
        log.lock().unwrap().clone()
    }
}

impl Channel for MockChannel {
    async fn pair() -> Result<Self, Error> {
        Ok(Self::default())
    }

    async fn connect() -> Result<Self, Error> {
        Ok(Self::default())
    }

    async fn control_out(&self, request: Request, value: u16, data: &[u8]) -> Result<(), Error> {
        self.log.lock().unwrap().push(Transfer::Out {
            request,
            value,
            data: data.to_vec(),
        });
        Ok(())
    }

    async fn control_in(&self, request: Request, value: u16, length: u16) -> Result<Vec<u8>, Error> {
        self.log.lock().unwrap().push(Transfer::In {
            request,
            value,
            length,
        });
        self.in_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(Error::NoResponse))
    }
}
