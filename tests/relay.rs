//! End-to-end tests against an in-process broadcast relay.

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use common::{Relay, WAIT, init_tracing, manager, wait_messages, wait_status};
use relay_chat_client::{
    ConnectionManager, ConnectionState, Message, ReconnectPolicy, Reconnector, Role,
};
use tokio::time::timeout;

// ============================================================================
// Broadcast
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_both_clients_once() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::start().await?;

    let alice = manager(&relay.url())?;
    let bob = manager(&relay.url())?;
    alice.start();
    bob.start();
    wait_status(&alice, |s| s.ready).await?;
    wait_status(&bob, |s| s.ready).await?;

    alice.send(&Message::user("P1", "Hello from P1")?);

    wait_messages(&alice, 1).await?;
    wait_messages(&bob, 1).await?;

    // Give a duplicate time to show up
    tokio::time::sleep(Duration::from_millis(100)).await;

    for log in [alice.messages(), bob.messages()] {
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role(), Role::User);
        assert_eq!(log[0].sender(), "P1");
        assert_eq!(log[0].text(), "Hello from P1");
    }

    Ok(())
}

#[tokio::test]
async fn test_subscriber_sees_own_echo() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::start().await?;

    let client = manager(&relay.url())?;
    let mut messages = client.subscribe();
    client.start();
    wait_status(&client, |s| s.ready).await?;

    client.send(&Message::user("P1", "Hello from P1")?);

    let echo = timeout(WAIT, messages.recv()).await??;
    assert_eq!(echo.sender(), "P1");
    assert_eq!(echo.text(), "Hello from P1");

    client.stop();
    Ok(())
}

#[tokio::test]
async fn test_messages_arrive_in_send_order() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::start().await?;

    let client = manager(&relay.url())?;
    client.start();
    wait_status(&client, |s| s.ready).await?;

    let texts: Vec<String> = (0..20).map(|i| format!("message {i}")).collect();
    for text in &texts {
        client.send(&Message::user("P1", text.as_str())?);
    }

    wait_messages(&client, texts.len()).await?;
    let received: Vec<String> =
        client.with_messages(|log| log.iter().map(|m| m.text().to_owned()).collect());
    assert_eq!(received, texts);

    Ok(())
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::start().await?;

    let client = manager(&relay.url())?;
    let mut messages = client.subscribe();
    client.start();
    wait_status(&client, |s| s.ready).await?;

    relay.inject(r#"{"sender":"P2","content":{"text":"before","role":"USER"}}"#);
    relay.inject("this is not json");
    relay.inject(r#"{"sender":"P2","content":{"role":"USER"}}"#);
    relay.inject(r#"{"sender":"P2","content":{"text":"after","role":"USER"}}"#);

    assert_eq!(timeout(WAIT, messages.recv()).await??.text(), "before");
    assert_eq!(timeout(WAIT, messages.recv()).await??.text(), "after");
    assert_eq!(client.message_count(), 2);
    assert!(client.is_ready());
    assert!(!client.has_error());

    Ok(())
}

#[tokio::test]
async fn test_join_announcement_attributed_to_system() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::start_with(true).await?;

    let first = manager(&relay.url())?;
    first.start();
    wait_status(&first, |s| s.ready).await?;

    let second = manager(&relay.url())?;
    second.start();
    wait_status(&second, |s| s.ready).await?;

    wait_messages(&first, 1).await?;
    let log = first.messages();
    let join = &log[0];
    assert_eq!(join.role(), Role::System);
    assert_eq!(join.sender(), "System");
    assert_eq!(join.text(), "A new client has connected.");
    assert!(join.is_system());

    Ok(())
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_unreachable_relay_sets_error() -> anyhow::Result<()> {
    init_tracing();

    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let client = manager(&format!("ws://{addr}/ws"))?;
    client.start();

    wait_status(&client, |s| s.has_error).await?;
    assert!(!client.is_ready());

    let mut state = client.watch_connection_state();
    timeout(WAIT, state.wait_for(|s| s.is_closed())).await??;

    Ok(())
}

#[tokio::test]
async fn test_teardown_closes_and_stops_sending() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::start().await?;

    let client = manager(&relay.url())?;
    client.start();
    wait_status(&client, |s| s.ready).await?;

    client.stop();
    client.stop();
    assert_eq!(client.connection_state(), ConnectionState::Closed);

    wait_status(&client, |s| !s.ready).await?;
    assert!(!client.has_error());

    client.send(&Message::user("P1", "after teardown")?);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.message_count(), 0);

    timeout(WAIT, async {
        while relay.client_count() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;

    Ok(())
}

#[tokio::test]
async fn test_explicit_connect_keeps_log() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::start().await?;

    let client = Arc::new(
        ConnectionManager::builder()
            .endpoint(relay.url())
            .build()?,
    );
    let policy = ReconnectPolicy::default()
        .with_initial_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_millis(50));
    let _reconnector = Reconnector::spawn(&client, policy);

    client.start();
    wait_status(&client, |s| s.ready).await?;

    // Explicit connect replaces the transport; the log survives
    relay.inject(r#"{"sender":"P2","content":{"text":"kept","role":"USER"}}"#);
    wait_messages(&client, 1).await?;

    client.connect(&relay.url())?;
    assert!(!client.is_ready());
    wait_status(&client, |s| s.ready && !s.has_error).await?;
    assert_eq!(client.message_count(), 1);

    client.send(&Message::user("P1", "still here")?);
    wait_messages(&client, 2).await?;

    Ok(())
}
