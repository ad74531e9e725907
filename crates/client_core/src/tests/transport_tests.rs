use super::*;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::Mutex;

/// Peer side of one scripted connection epoch. Dropping it kills the epoch.
struct Epoch {
    outbound_rx: mpsc::Receiver<String>,
    inbound_tx: mpsc::Sender<String>,
}

/// Connector whose dial outcomes follow a script; once the script is empty
/// every further dial fails. Successful dials hand the epoch's peer side to
/// the test through a channel.
struct ScriptedConnector {
    dials: AtomicU32,
    outcomes: Mutex<VecDeque<bool>>,
    epoch_tx: mpsc::UnboundedSender<Epoch>,
}

impl ScriptedConnector {
    fn new(outcomes: impl IntoIterator<Item = bool>) -> (Arc<Self>, mpsc::UnboundedReceiver<Epoch>) {
        let (epoch_tx, epoch_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            dials: AtomicU32::new(0),
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            epoch_tx,
        });
        (connector, epoch_rx)
    }

    fn failing() -> (Arc<Self>, mpsc::UnboundedReceiver<Epoch>) {
        Self::new([])
    }

    fn dials(&self) -> u32 {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &str) -> Result<WireDuplex, TransportError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        let succeed = self.outcomes.lock().await.pop_front().unwrap_or(false);
        if !succeed {
            return Err(TransportError::Handshake("connection refused".into()));
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(16);
        let (inbound_tx, inbound_rx) = mpsc::channel(16);
        self.epoch_tx
            .send(Epoch {
                outbound_rx,
                inbound_tx,
            })
            .expect("test holds the epoch receiver");
        Ok(WireDuplex {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

async fn wait_for_open(transport: &ChannelTransport) {
    loop {
        match transport.state().await {
            ConnectionState::Open => return,
            ConnectionState::Exhausted => panic!("transport exhausted while waiting for open"),
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
}

async fn wait_for_exhausted(events: &mut broadcast::Receiver<TransportEvent>) {
    loop {
        match events.recv().await.expect("events stream") {
            TransportEvent::Exhausted => return,
            TransportEvent::Frame(_) => {}
        }
    }
}

#[tokio::test]
async fn send_before_connect_fails_not_connected() {
    let (connector, _epochs) = ScriptedConnector::failing();
    let transport = ChannelTransport::spawn(connector, "ws://test");

    let err = transport
        .send("payload".into())
        .await
        .expect_err("must fail while not open");
    assert!(matches!(err, TransportError::NotConnected));
}

#[tokio::test(start_paused = true)]
async fn exhausts_after_initial_dial_plus_ten_retries() {
    let (connector, _epochs) = ScriptedConnector::failing();
    let transport = ChannelTransport::spawn(connector.clone(), "ws://test");
    let mut events = transport.events();

    wait_for_exhausted(&mut events).await;

    assert_eq!(connector.dials(), 11);
    assert_eq!(transport.state().await, ConnectionState::Exhausted);

    // No resumption later: the clock moves on and nothing redials.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.dials(), 11);
    assert_eq!(transport.state().await, ConnectionState::Exhausted);
}

#[tokio::test(start_paused = true)]
async fn send_after_exhaustion_reports_the_spent_budget() {
    let (connector, _epochs) = ScriptedConnector::failing();
    let transport = ChannelTransport::spawn(connector, "ws://test");
    let mut events = transport.events();

    wait_for_exhausted(&mut events).await;

    let err = transport
        .send("too late".into())
        .await
        .expect_err("channel is dead");
    assert!(matches!(err, TransportError::Exhausted { attempts: 11 }));
}

#[tokio::test(start_paused = true)]
async fn successful_dial_resets_retry_budget() {
    // Three failures, one success, then failures until exhaustion. Without
    // the reset the budget would run out after eleven dials in total; with
    // it the outage after the open epoch gets ten fresh retries.
    let (connector, mut epochs) = ScriptedConnector::new([false, false, false, true]);
    let transport = ChannelTransport::spawn(connector.clone(), "ws://test");
    let mut events = transport.events();

    let epoch = epochs.recv().await.expect("epoch");
    wait_for_open(&transport).await;
    assert_eq!(connector.dials(), 4);

    drop(epoch);
    wait_for_exhausted(&mut events).await;
    assert_eq!(connector.dials(), 14);
}

#[tokio::test(start_paused = true)]
async fn outbound_queued_in_dead_epoch_is_not_replayed() {
    let (connector, mut epochs) = ScriptedConnector::new([true, true]);
    let transport = ChannelTransport::spawn(connector, "ws://test");

    let epoch = epochs.recv().await.expect("first epoch");
    wait_for_open(&transport).await;
    transport
        .send("request from first epoch".into())
        .await
        .expect("send while open");

    // Kill the epoch with the request still sitting unread in its queue.
    drop(epoch);

    let mut next = epochs.recv().await.expect("second epoch");
    wait_for_open(&transport).await;

    assert!(matches!(next.outbound_rx.try_recv(), Err(TryRecvError::Empty)));

    transport
        .send("request from second epoch".into())
        .await
        .expect("send after reconnect");
    assert_eq!(
        next.outbound_rx.recv().await.as_deref(),
        Some("request from second epoch")
    );
}

#[tokio::test(start_paused = true)]
async fn frames_fan_out_to_every_listener_in_arrival_order() {
    let (connector, mut epochs) = ScriptedConnector::new([true]);
    let transport = ChannelTransport::spawn(connector, "ws://test");
    let mut first = transport.events();
    let mut second = transport.events();

    let epoch = epochs.recv().await.expect("epoch");
    wait_for_open(&transport).await;

    epoch.inbound_tx.send("one".into()).await.expect("inject");
    epoch.inbound_tx.send("two".into()).await.expect("inject");

    for events in [&mut first, &mut second] {
        for expected in ["one", "two"] {
            match events.recv().await.expect("frame") {
                TransportEvent::Frame(raw) => assert_eq!(raw, expected),
                TransportEvent::Exhausted => panic!("unexpected exhaustion"),
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn send_fails_not_connected_between_epochs() {
    let (connector, mut epochs) = ScriptedConnector::new([true]);
    let transport = ChannelTransport::spawn(connector, "ws://test");

    let epoch = epochs.recv().await.expect("epoch");
    wait_for_open(&transport).await;
    drop(epoch);

    // Wait for the transport to notice the loss.
    loop {
        match transport.state().await {
            ConnectionState::Open => tokio::time::sleep(Duration::from_millis(10)).await,
            _ => break,
        }
    }

    let err = transport
        .send("too late".into())
        .await
        .expect_err("epoch is gone");
    assert!(matches!(err, TransportError::NotConnected));
}
