//! End-to-end session behaviour over real loopback sockets.

mod support;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{sleep, timeout},
};

use support::{WAIT, dead_destination, start_relay, target_listener};

#[tokio::test]
async fn relays_bytes_in_both_directions() {
    let (target_addr, target) = target_listener().await;
    let relay = start_relay(target_addr).await;

    let mut client = TcpStream::connect(relay.addr).await.expect("connect");
    let (mut peer, _) = target.accept().await.expect("target accept");

    client.write_all(b"hello").await.expect("client write");
    let mut buf = [0u8; 5];
    timeout(WAIT, peer.read_exact(&mut buf))
        .await
        .expect("target read timely")
        .expect("target read");
    assert_eq!(&buf, b"hello");

    peer.write_all(b"world").await.expect("target write");
    timeout(WAIT, client.read_exact(&mut buf))
        .await
        .expect("client read timely")
        .expect("client read");
    assert_eq!(&buf, b"world");

    relay.shutdown().await;
}

#[tokio::test]
async fn passthrough_preserves_arbitrary_chunking() {
    let (target_addr, target) = target_listener().await;
    let relay = start_relay(target_addr).await;

    let mut client = TcpStream::connect(relay.addr).await.expect("connect");
    let (mut peer, _) = target.accept().await.expect("target accept");

    // No chunk starts with a recognised opcode, so every read is forwarded
    // as it arrives regardless of how the sender splits the stream.
    let payload: Vec<u8> = (0u8..=255).cycle().take(2000).map(|b| b | 0x80).collect();
    for chunk in payload.chunks(33) {
        client.write_all(chunk).await.expect("client write");
        sleep(std::time::Duration::from_millis(1)).await;
    }

    let mut received = vec![0u8; payload.len()];
    timeout(WAIT, peer.read_exact(&mut received))
        .await
        .expect("target read timely")
        .expect("target read");
    assert_eq!(received, payload);

    relay.shutdown().await;
}

#[tokio::test]
async fn concurrent_sessions_stay_isolated() {
    let (target_addr, target) = target_listener().await;
    let relay = start_relay(target_addr).await;

    let mut client_a = TcpStream::connect(relay.addr).await.expect("connect a");
    let (mut peer_a, _) = target.accept().await.expect("accept a");
    let mut client_b = TcpStream::connect(relay.addr).await.expect("connect b");
    let (mut peer_b, _) = target.accept().await.expect("accept b");

    client_a.write_all(b"alpha").await.expect("a write");
    client_b.write_all(b"bravo").await.expect("b write");

    let mut buf = [0u8; 5];
    timeout(WAIT, peer_a.read_exact(&mut buf))
        .await
        .expect("peer a read timely")
        .expect("peer a read");
    assert_eq!(&buf, b"alpha");
    timeout(WAIT, peer_b.read_exact(&mut buf))
        .await
        .expect("peer b read timely")
        .expect("peer b read");
    assert_eq!(&buf, b"bravo");

    peer_b.write_all(b"romeo").await.expect("b reply");
    peer_a.write_all(b"delta").await.expect("a reply");

    timeout(WAIT, client_a.read_exact(&mut buf))
        .await
        .expect("client a read timely")
        .expect("client a read");
    assert_eq!(&buf, b"delta");
    timeout(WAIT, client_b.read_exact(&mut buf))
        .await
        .expect("client b read timely")
        .expect("client b read");
    assert_eq!(&buf, b"romeo");

    relay.shutdown().await;
}

#[tokio::test]
async fn destination_close_ends_only_its_session() {
    let (target_addr, target) = target_listener().await;
    let relay = start_relay(target_addr).await;

    let mut client_a = TcpStream::connect(relay.addr).await.expect("connect a");
    let (peer_a, _) = target.accept().await.expect("accept a");
    let mut client_b = TcpStream::connect(relay.addr).await.expect("connect b");
    let (mut peer_b, _) = target.accept().await.expect("accept b");

    // The destination abandons session A; the relay closes A's client.
    drop(peer_a);
    let mut buf = [0u8; 8];
    let closed = timeout(WAIT, client_a.read(&mut buf))
        .await
        .expect("a closed timely");
    assert!(matches!(closed, Ok(0) | Err(_)));

    // Session B keeps relaying.
    client_b.write_all(b"ping").await.expect("b write");
    let mut ping = [0u8; 4];
    timeout(WAIT, peer_b.read_exact(&mut ping))
        .await
        .expect("peer b read timely")
        .expect("peer b read");
    assert_eq!(&ping, b"ping");
    peer_b.write_all(b"pong").await.expect("b reply");
    timeout(WAIT, client_b.read_exact(&mut ping))
        .await
        .expect("client b read timely")
        .expect("client b read");
    assert_eq!(&ping, b"pong");

    relay.shutdown().await;
}

#[tokio::test]
async fn unreachable_destination_closes_client_promptly() {
    let relay = start_relay(dead_destination().await).await;

    let mut client = TcpStream::connect(relay.addr)
        .await
        .expect("listener accepts");
    let mut buf = [0u8; 1];
    let closed = timeout(WAIT, client.read(&mut buf))
        .await
        .expect("closed timely");
    assert!(matches!(closed, Ok(0) | Err(_)));

    // A failed outbound connect does not impair the listener.
    let mut second = TcpStream::connect(relay.addr)
        .await
        .expect("listener still accepts");
    let closed = timeout(WAIT, second.read(&mut buf))
        .await
        .expect("closed timely");
    assert!(matches!(closed, Ok(0) | Err(_)));

    relay.shutdown().await;
}

#[tokio::test]
async fn shutdown_ends_active_sessions() {
    let (target_addr, target) = target_listener().await;
    let relay = start_relay(target_addr).await;

    let mut client = TcpStream::connect(relay.addr).await.expect("connect");
    let (mut peer, _) = target.accept().await.expect("target accept");

    client.write_all(b"warm").await.expect("client write");
    let mut buf = [0u8; 4];
    timeout(WAIT, peer.read_exact(&mut buf))
        .await
        .expect("target read timely")
        .expect("target read");

    // Shutdown returns even though the session is mid-conversation, and the
    // session's sockets are closed with it.
    timeout(WAIT, relay.shutdown())
        .await
        .expect("shutdown timely");
    let mut probe = [0u8; 1];
    let closed = timeout(WAIT, client.read(&mut probe))
        .await
        .expect("close observed timely");
    assert!(matches!(closed, Ok(0) | Err(_)));
}
