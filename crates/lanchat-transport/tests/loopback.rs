//! Live multicast tests over a real interface.
//!
//! These join an actual multicast group and rely on the local stack echoing
//! traffic back, so they are ignored by default. Run them on a machine with
//! a multicast-capable interface:
//!
//! ```text
//! cargo test -p lanchat-transport -- --ignored
//! ```

use std::time::Duration;

use tokio::time::timeout;

use lanchat_transport::{Transport, TransportConfig};

const RECV_WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
#[ignore = "requires a multicast-capable network interface"]
async fn test_two_instances_round_trip() {
    let config = TransportConfig::with_group_id(200).unwrap();

    let mut a = Transport::join(&config).await.unwrap();
    let mut b = Transport::join(&config).await.unwrap();
    assert_ne!(a.local_addr(), b.local_addr());

    a.send("hello").unwrap();

    // B sees the message with A's transmit address as the sender.
    let at_b = timeout(RECV_WAIT, b.recv()).await.unwrap().unwrap();
    assert_eq!(at_b.text, "hello");
    assert_eq!(at_b.from, a.local_addr());
    assert!(!at_b.is_local_echo(b.local_addr()));

    // A receives its own echo and can identify it by address.
    let at_a = timeout(RECV_WAIT, a.recv()).await.unwrap().unwrap();
    assert_eq!(at_a.text, "hello");
    assert!(at_a.is_local_echo(a.local_addr()));

    for transport in [a, b] {
        transport.shutdown();
        transport.closed().await.unwrap();
    }
}

#[tokio::test]
#[ignore = "requires a multicast-capable network interface"]
async fn test_payloads_arrive_in_order() {
    let config = TransportConfig::with_group_id(201).unwrap();
    let mut transport = Transport::join(&config).await.unwrap();

    for n in 0..3 {
        transport.send(n.to_string()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let mut last_arrival = None;
    for expected in ["0", "1", "2"] {
        let message = timeout(RECV_WAIT, transport.recv()).await.unwrap().unwrap();
        assert_eq!(message.text, expected);
        assert!(message.is_local_echo(transport.local_addr()));

        let now = std::time::Instant::now();
        if let Some(previous) = last_arrival {
            assert!(now >= previous);
        }
        last_arrival = Some(now);
    }

    transport.shutdown();
    transport.closed().await.unwrap();
}
