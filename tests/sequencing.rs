//! Operation sequencing against a scripted channel: every bRequest, wValue
//! and payload on the wire is part of the bootloader contract.

mod common;

use avrdfu::command::{ERASE, RESTART};
use avrdfu::{Dfu, Error, ReadCommand, Request, StateCode};
use common::*;
use std::time::Duration;

#[tokio::test]
async fn test_download_issues_one_dnload_then_one_getstatus() {
    let channel = MockChannel::new();
    let log = channel.log.clone();
    channel.push_in(&STATUS_DNLOAD_IDLE);
    let mut dfu = Dfu::with_channel(channel);

    let status = dfu.download(&[0xAA, 0xBB]).await.expect("download");
    assert_eq!(status.state, StateCode::DfuDnloadIdle);

    let transfers = MockChannel::transfers(&log);
    assert_eq!(transfers.len(), 2, "exactly one DNLOAD and one GETSTATUS");
    match &transfers[0] {
        Transfer::Out {
            request,
            value,
            data,
        } => {
            assert_eq!(*request, Request::Dnload);
            assert_eq!(*value, 0);
            assert_eq!(data.len(), 50, "32-byte header + 2 bytes + 16-byte suffix");
            assert_eq!(data[0], 0x01, "program-start opcode");
            assert_eq!(&data[32..34], &[0xAA, 0xBB]);
        }
        other => panic!("expected DNLOAD, got {other:?}"),
    }
    assert_eq!(
        transfers[1],
        Transfer::In {
            request: Request::GetStatus,
            value: 0,
            length: 6,
        }
    );
}

#[tokio::test]
async fn test_erase_sends_erase_command_via_dnload() {
    let channel = MockChannel::new();
    let log = channel.log.clone();
    let mut dfu = Dfu::with_channel(channel);

    dfu.erase().await.expect("erase");

    assert_eq!(
        MockChannel::transfers(&log),
        vec![Transfer::Out {
            request: Request::Dnload,
            value: 0,
            data: ERASE.to_vec(),
        }]
    );
}

#[tokio::test]
async fn test_read_issues_dnload_getstatus_upload_and_returns_byte() {
    let channel = MockChannel::new();
    let log = channel.log.clone();
    channel.push_in(&STATUS_DNLOAD_IDLE);
    channel.push_in(&[0x58]);
    let mut dfu = Dfu::with_channel(channel);

    let value = dfu
        .read(ReadCommand::ManufacturerCode)
        .await
        .expect("read manufacturer code");
    assert_eq!(value, 0x58, "Atmel manufacturer code");

    let transfers = MockChannel::transfers(&log);
    assert_eq!(
        transfers,
        vec![
            Transfer::Out {
                request: Request::Dnload,
                value: 0,
                data: vec![0x05, 0x01, 0x30],
            },
            Transfer::In {
                request: Request::GetStatus,
                value: 0,
                length: 6,
            },
            Transfer::In {
                request: Request::Upload,
                value: 0,
                length: 1,
            },
        ]
    );
}

#[tokio::test]
async fn test_restart_sends_two_dnloads_then_drops_the_handle() {
    let channel = MockChannel::new();
    let log = channel.log.clone();
    let mut dfu = Dfu::with_channel(channel);

    dfu.restart().await.expect("restart");

    let transfers = MockChannel::transfers(&log);
    assert_eq!(
        transfers,
        vec![
            Transfer::Out {
                request: Request::Dnload,
                value: 0,
                data: RESTART.to_vec(),
            },
            Transfer::Out {
                request: Request::Dnload,
                value: 0,
                data: vec![],
            },
        ]
    );

    let err = dfu.send(&[0x00]).await.expect_err("handle must be gone");
    assert!(matches!(err, Error::DeviceNotConnected));
}

#[tokio::test]
async fn test_get_state_requests_one_byte() {
    let channel = MockChannel::new();
    let log = channel.log.clone();
    channel.push_in(&[0x02]);
    let mut dfu = Dfu::with_channel(channel);

    let state = dfu.get_state().await.expect("get_state");
    assert_eq!(state, StateCode::DfuIdle);
    assert_eq!(
        MockChannel::transfers(&log),
        vec![Transfer::In {
            request: Request::GetState,
            value: 0,
            length: 1,
        }]
    );
}

#[tokio::test]
async fn test_abort_and_clear_status_use_empty_payloads() {
    let channel = MockChannel::new();
    let log = channel.log.clone();
    let mut dfu = Dfu::with_channel(channel);

    dfu.abort().await.expect("abort");
    dfu.clear_status().await.expect("clear status");

    assert_eq!(
        MockChannel::transfers(&log),
        vec![
            Transfer::Out {
                request: Request::Abort,
                value: 0,
                data: vec![],
            },
            Transfer::Out {
                request: Request::ClrStatus,
                value: 0,
                data: vec![],
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_poll_timeout_gates_the_next_status_poll() {
    let channel = MockChannel::new();
    // First poll advertises 100 ms while busy, second reports idle.
    channel.push_in(&[0x00, 0x64, 0x00, 0x00, 0x04, 0x00]);
    channel.push_in(&STATUS_DNLOAD_IDLE);
    let mut dfu = Dfu::with_channel(channel);

    let start = tokio::time::Instant::now();
    let busy = dfu.get_status().await.expect("first poll");
    assert_eq!(busy.state, StateCode::DfuDnbusy);
    assert_eq!(busy.poll_timeout_ms, 100);
    assert!(start.elapsed() < Duration::from_millis(100));

    dfu.get_status().await.expect("second poll");
    assert!(
        start.elapsed() >= Duration::from_millis(100),
        "second poll must wait out the advertised timeout"
    );
}
