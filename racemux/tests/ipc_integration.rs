//! End-to-end tests over real sockets.
//!
//! Each test binds the arbiter on a Unix datagram socket in a temporary
//! directory and drives it through [`IpcSender`] (and, for the network path,
//! a UDP driver-station packet), then inspects what reached the actuator.
//!
//! Run with: `cargo test --test ipc_integration`

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{UdpSocket, UnixDatagram};
use tokio_util::sync::CancellationToken;

use racemux::actuator::RecordingActuator;
use racemux::arbiter::{ArbiterConfig, ArbiterService};
use racemux::calibration::CalibrationLogger;
use racemux::clock::monotonic_secs;
use racemux::command::{Command, CommandSource, ControlEvent, Message};
use racemux::diagnostics::DiagnosticCounters;
use racemux::producer::{IpcSender, NetworkConfig, NetworkProducer, SpeedEncoding, WirePacket};
use racemux::telemetry::NoTelemetry;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[tokio::test]
async fn test_joystick_command_reaches_actuator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ctrl.sock");
    let recorder = RecordingActuator::new();
    let diagnostics = Arc::new(DiagnosticCounters::new());

    let config = ArbiterConfig::default().with_socket_path(&path);
    let service = ArbiterService::bind(config, recorder.clone(), Arc::clone(&diagnostics)).unwrap();
    let mut sender = IpcSender::new(&path, CommandSource::Joystick, Arc::clone(&diagnostics)).unwrap();

    let shutdown = CancellationToken::new();
    let driver = {
        let shutdown = shutdown.clone();
        async move {
            let command = Command::joystick(0.5, 0.3, monotonic_secs());
            assert!(sender.send(&command.into()));
            tokio::time::sleep(Duration::from_millis(100)).await;
            shutdown.cancel();
        }
    };

    let (result, ()) = tokio::join!(service.run(shutdown), driver);
    let snapshot = result.unwrap();

    assert_eq!(snapshot.messages_received, 1);
    assert!(snapshot.commands_applied >= 1);
    assert!(recorder
        .history()
        .iter()
        .any(|a| approx(a.steering, 0.5) && approx(a.throttle, 0.3)));
    assert!(recorder.last().is_neutral());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_malformed_datagram_is_counted_and_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ctrl.sock");
    let recorder = RecordingActuator::new();

    let config = ArbiterConfig::default().with_socket_path(&path);
    let service = ArbiterService::bind(config, recorder.clone(), Arc::default()).unwrap();
    let raw = UnixDatagram::unbound().unwrap();

    let shutdown = CancellationToken::new();
    let driver = {
        let shutdown = shutdown.clone();
        let path = path.clone();
        async move {
            raw.send_to(b"{not json", &path).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            shutdown.cancel();
        }
    };

    let (result, ()) = tokio::join!(service.run(shutdown), driver);
    let snapshot = result.unwrap();

    assert_eq!(snapshot.messages_received, 1);
    assert_eq!(snapshot.messages_dropped, 1);
    assert!(recorder.history().iter().all(|a| a.is_neutral()));
}

#[tokio::test]
async fn test_adjust_event_is_logged_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ctrl.sock");
    let logger = CalibrationLogger::create_in(&dir.path().join("logs"), "arbiter").unwrap();
    let log_path = logger.path().to_path_buf();

    let config = ArbiterConfig::default().with_socket_path(&path);
    let service = ArbiterService::bind(config, RecordingActuator::new(), Arc::default())
        .unwrap()
        .with_calibration_log(logger);
    let mut sender = IpcSender::new(&path, CommandSource::Network, Arc::default()).unwrap();

    let shutdown = CancellationToken::new();
    let driver = {
        let shutdown = shutdown.clone();
        async move {
            let event: Message = ControlEvent::CalibrationAdjust(-0.001).into();
            assert!(sender.send(&event));
            tokio::time::sleep(Duration::from_millis(50)).await;
            shutdown.cancel();
        }
    };

    let (result, ()) = tokio::join!(service.run(shutdown), driver);
    assert_eq!(result.unwrap().adjustments_applied, 1);

    let contents = std::fs::read_to_string(log_path).unwrap();
    let rows: Vec<&str> = contents.lines().skip(1).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].contains(",adjust,"));
    assert!(rows[0].contains("0.3400"));
}

#[tokio::test]
async fn test_network_packet_drives_arbiter_in_network_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ctrl.sock");
    let recorder = RecordingActuator::new();
    let diagnostics = Arc::new(DiagnosticCounters::new());

    let service = ArbiterService::bind(
        ArbiterConfig::default().with_socket_path(&path),
        recorder.clone(),
        Arc::clone(&diagnostics),
    )
    .unwrap();

    let network_config = NetworkConfig::default().with_bind_addr("127.0.0.1:0");
    let sender = IpcSender::new(&path, CommandSource::Network, Arc::clone(&diagnostics)).unwrap();
    let producer = NetworkProducer::bind(network_config, sender, NoTelemetry, Arc::clone(&diagnostics))
        .await
        .unwrap();
    let udp_target = producer.local_addr().unwrap();

    let mut events = IpcSender::new(&path, CommandSource::Joystick, Arc::clone(&diagnostics)).unwrap();
    let driver_station = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let shutdown = CancellationToken::new();
    let driver = {
        let shutdown = shutdown.clone();
        async move {
            assert!(events.send(&ControlEvent::ModeToggle.into()));
            let packet = WirePacket {
                steering: -0.25,
                speed: 3.0,
                sequence: 1,
            };
            driver_station
                .send_to(&packet.encode(SpeedEncoding::Int), udp_target)
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            shutdown.cancel();
        }
    };

    let (arbiter_result, producer_result, ()) =
        tokio::join!(service.run(shutdown.clone()), producer.run(shutdown.clone()), driver);
    arbiter_result.unwrap();
    producer_result.unwrap();

    assert_eq!(diagnostics.snapshot().packets_received, 1);
    assert!(recorder
        .history()
        .iter()
        .any(|a| approx(a.steering, -0.25) && a.throttle > 0.0));
    assert!(recorder.last().is_neutral());
}
