use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use tagnode::adapter::{run_console, ConsoleCommand, ConsoleConfig, ConsoleEvent};

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ConsoleEvent>) -> ConsoleEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no console event")
        .expect("event channel closed")
}

#[tokio::test]
async fn console_reports_lines_and_forwards_commands() {
    let config = ConsoleConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ConsoleEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ConsoleCommand>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        let _ = run_console(config, events_tx, cmd_rx, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("console did not signal ready")
        .expect("ready channel dropped");

    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let device_id = match next_event(&mut events_rx).await {
        ConsoleEvent::Connected { device_id, .. } => device_id,
        other => panic!("unexpected event {:?}", other),
    };

    write_half.write_all(b"ROLE NFC BOX\nSCAN 04A2\n").await.unwrap();
    write_half.flush().await.unwrap();

    assert_eq!(
        next_event(&mut events_rx).await,
        ConsoleEvent::Announced {
            device_id,
            component: "NFC".to_string(),
            role: "BOX".to_string(),
        }
    );
    assert_eq!(
        next_event(&mut events_rx).await,
        ConsoleEvent::Line {
            device_id,
            line: "SCAN 04A2".to_string(),
        }
    );

    cmd_tx
        .send(ConsoleCommand::ToDevice {
            device_id,
            line: "READUID 3".to_string(),
        })
        .unwrap();
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .unwrap()
        .unwrap()
        .expect("expected forwarded line");
    assert_eq!(line, "READUID 3");

    cmd_tx
        .send(ConsoleCommand::Broadcast {
            line: "PING 8".to_string(),
        })
        .unwrap();
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .unwrap()
        .unwrap()
        .expect("expected broadcast line");
    assert_eq!(line, "PING 8");

    drop(write_half);
    drop(lines);
    assert_eq!(
        next_event(&mut events_rx).await,
        ConsoleEvent::Disconnected { device_id }
    );

    server_handle.abort();
}
