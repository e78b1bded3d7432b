//! End-to-end tests: client <-> relay <-> origin over loopback

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener as StdListener, TcpStream as StdStream};
    use std::thread;
    use std::time::Duration;

    use relais::{RelayConfig, RelayServer};

    const POLL_TIMEOUT: Duration = Duration::from_millis(50);
    const MAX_SPINS: usize = 200;

    /// Spawn a blocking echo origin that serves every accepted connection
    /// until the peer closes its sending side
    fn spawn_echo_origin() -> SocketAddr {
        let listener = StdListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                thread::spawn(move || {
                    let mut buf = [0u8; 4096];
                    loop {
                        match stream.read(&mut buf) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                if stream.write_all(&buf[..n]).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                });
            }
        });
        addr
    }

    fn relay_to(origin: SocketAddr) -> RelayServer {
        let config = RelayConfig::new("127.0.0.1:0".parse().unwrap(), origin);
        RelayServer::new(config).unwrap()
    }

    /// Drive the relay loop until `done` reports true
    fn spin_until(server: &mut RelayServer, mut done: impl FnMut(&RelayServer) -> bool) {
        for _ in 0..MAX_SPINS {
            server.poll_once(Some(POLL_TIMEOUT)).unwrap();
            if done(server) {
                return;
            }
        }
        panic!("relay did not reach the expected state");
    }

    #[test]
    fn test_round_trip_preserves_bytes() {
        let origin = spawn_echo_origin();
        let mut server = relay_to(origin);
        let proxy_addr = server.local_addr().unwrap();

        let mut client = StdStream::connect(proxy_addr).unwrap();
        client.set_nonblocking(true).unwrap();
        spin_until(&mut server, |s| s.active_sessions() == 1);

        let payload = b"LIST\r\n1 120\r\n2 340\r\n.\r\n";
        client.write_all(payload).unwrap();

        let mut echoed = Vec::new();
        for _ in 0..MAX_SPINS {
            server.poll_once(Some(POLL_TIMEOUT)).unwrap();
            let mut chunk = [0u8; 1024];
            match client.read(&mut chunk) {
                Ok(n) => echoed.extend_from_slice(&chunk[..n]),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => panic!("client read failed: {}", e),
            }
            if echoed.len() >= payload.len() {
                break;
            }
        }
        assert_eq!(&echoed, payload);

        // closing the client collapses the session and recycles it
        drop(client);
        spin_until(&mut server, |s| s.active_sessions() == 0);
        assert_eq!(server.stats().sessions_accepted, 1);
        assert_eq!(server.stats().sessions_closed, 1);
        assert_eq!(server.stats().bytes_client_to_origin, payload.len() as u64);
        assert_eq!(server.stats().bytes_origin_to_client, payload.len() as u64);
        assert_eq!(server.pool().len(), 1);
    }

    #[test]
    fn test_sessions_are_recycled_across_connections() {
        let origin = spawn_echo_origin();
        let mut server = relay_to(origin);
        let proxy_addr = server.local_addr().unwrap();

        for round in 0..3u8 {
            let mut client = StdStream::connect(proxy_addr).unwrap();
            client.set_nonblocking(true).unwrap();
            spin_until(&mut server, |s| s.active_sessions() == 1);

            client.write_all(&[round; 16]).unwrap();
            let mut got = 0;
            for _ in 0..MAX_SPINS {
                server.poll_once(Some(POLL_TIMEOUT)).unwrap();
                let mut chunk = [0u8; 64];
                match client.read(&mut chunk) {
                    Ok(n) => {
                        assert!(chunk[..n].iter().all(|b| *b == round));
                        got += n;
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                    Err(e) => panic!("client read failed: {}", e),
                }
                if got >= 16 {
                    break;
                }
            }
            assert_eq!(got, 16);

            drop(client);
            spin_until(&mut server, |s| s.active_sessions() == 0);
        }

        assert_eq!(server.stats().sessions_accepted, 3);
        assert_eq!(server.stats().sessions_closed, 3);
        // the pool served rounds two and three from its free list
        assert_eq!(server.pool().stats().fresh, 1);
        assert_eq!(server.pool().stats().recycled, 2);
        assert_eq!(server.pool().len(), 1);
    }

    #[test]
    fn test_unreachable_origin_fails_only_that_session() {
        // a listener we immediately drop leaves a port nothing accepts on
        let dead = StdListener::bind("127.0.0.1:0").unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);

        let mut server = relay_to(dead_addr);
        let proxy_addr = server.local_addr().unwrap();

        let client = StdStream::connect(proxy_addr).unwrap();
        // the dial is refused asynchronously; the server must survive it
        spin_until(&mut server, |s| {
            s.stats().sessions_failed + s.stats().dial_failures > 0 && s.active_sessions() == 0
        });
        drop(client);

        // and keep serving: a healthy origin still round-trips
        let origin = spawn_echo_origin();
        let mut healthy = relay_to(origin);
        let healthy_addr = healthy.local_addr().unwrap();
        let mut client = StdStream::connect(healthy_addr).unwrap();
        client.set_nonblocking(true).unwrap();
        spin_until(&mut healthy, |s| s.active_sessions() == 1);
        client.write_all(b"ping").unwrap();
        let mut chunk = [0u8; 16];
        for _ in 0..MAX_SPINS {
            healthy.poll_once(Some(POLL_TIMEOUT)).unwrap();
            match client.read(&mut chunk) {
                Ok(n) if n > 0 => {
                    assert_eq!(&chunk[..n], b"ping");
                    return;
                }
                Ok(_) => panic!("unexpected close"),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => panic!("client read failed: {}", e),
            }
        }
        panic!("echo never arrived");
    }
}
