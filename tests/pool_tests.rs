//! Tests for the session pool: capacity bound and clean reuse

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::{TcpListener as StdListener, TcpStream as StdStream};
    use std::thread::sleep;
    use std::time::Duration;

    use mio::net::TcpStream;
    use mio::{Poll, Token};
    use relais::{Duplex, SessionPool, SessionState, Side};

    /// Build a connected non-blocking stream pair over loopback
    fn tcp_pair() -> (TcpStream, StdStream) {
        let listener = StdListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let remote = StdStream::connect(addr).unwrap();
        let (local, _) = listener.accept().unwrap();
        local.set_nonblocking(true).unwrap();
        (TcpStream::from_std(local), remote)
    }

    #[test]
    fn test_pool_starts_empty() {
        let pool = SessionPool::new(8, 2048);
        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.stats().reuse_rate(), 0.0);
    }

    #[test]
    fn test_capacity_bound_discards_beyond_max() {
        let mut pool = SessionPool::new(2, 256);
        let mut keep_remote = Vec::new();

        // release three sessions into a pool bounded at two
        for i in 0..3 {
            let (client, r1) = tcp_pair();
            let (origin, r2) = tcp_pair();
            keep_remote.push((r1, r2));
            let session = pool
                .alloc(client, origin, Token(10 + i * 2), Token(11 + i * 2))
                .unwrap();
            pool.release(session);
        }

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().discarded, 1);
        assert_eq!(pool.stats().fresh, 3);
    }

    #[test]
    fn test_clean_reuse() {
        let poll = Poll::new().unwrap();
        let registry = poll.registry();
        let mut pool = SessionPool::new(4, 256);

        let (client, mut remote_client) = tcp_pair();
        let (origin, _remote_origin) = tcp_pair();
        let first = pool.alloc(client, origin, Token(1), Token(2)).unwrap();

        // dirty the session through the copy engine so the reset has real
        // state to clear
        {
            let mut session = first.borrow_mut();
            session.begin_connect(registry).unwrap();
            session.finish_connect(registry).unwrap();
            assert_eq!(session.state(), SessionState::Copy);

            remote_client.write_all(b"leftover").unwrap();
            sleep(Duration::from_millis(50));
            session.copy_read(registry, Side::Client).unwrap();
            assert_eq!(session.buffered(Side::Client), 8);

            session.close(registry);
        }
        pool.release(first);

        let (client, _rc) = tcp_pair();
        let (origin, _ro) = tcp_pair();
        let reused = pool.alloc(client, origin, Token(3), Token(4)).unwrap();
        let session = reused.borrow();

        assert_eq!(pool.stats().recycled, 1);
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(session.client_token(), Token(3));
        assert_eq!(session.origin_token(), Token(4));
        assert_eq!(session.duplex(Side::Client), Duplex::BOTH);
        assert_eq!(session.duplex(Side::Origin), Duplex::BOTH);
        assert_eq!(session.buffered(Side::Client), 0);
        assert_eq!(session.buffered(Side::Origin), 0);
        assert_eq!(session.bytes_copied(), (0, 0));
    }
}
