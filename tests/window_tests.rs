//! Tests for the ByteWindow backpressure buffer

#[cfg(test)]
mod tests {
    use relais::ByteWindow;

    #[test]
    fn test_region_bounds_respected() {
        let mut window = ByteWindow::new(16).unwrap();

        // a write is always bounded by the reported writable region
        let room = window.writable_region().len();
        assert_eq!(room, 16);
        window.writable_region()[..10].copy_from_slice(&[7u8; 10]);
        window.advance_write(10).unwrap();
        assert_eq!(window.writable_region().len(), 6);

        // a read is always bounded by the reported readable region
        assert_eq!(window.readable_region().len(), 10);
        window.advance_read(10).unwrap();
        assert_eq!(window.readable_region().len(), 0);
    }

    #[test]
    fn test_overrun_is_an_error() {
        let mut window = ByteWindow::new(4).unwrap();

        assert!(window.advance_write(8).is_err());
        window.advance_write(4).unwrap();
        assert!(window.advance_write(1).is_err());
        assert!(window.advance_read(5).is_err());
    }

    #[test]
    fn test_byte_order_preserved() {
        let mut window = ByteWindow::new(32).unwrap();
        let payload = b"RETR 1\r\n+OK message follows\r\n";

        window.writable_region()[..payload.len()].copy_from_slice(payload);
        window.advance_write(payload.len()).unwrap();

        // drain in two chunks and reassemble
        let mut out = Vec::new();
        out.extend_from_slice(&window.readable_region()[..10]);
        window.advance_read(10).unwrap();
        out.extend_from_slice(window.readable_region());
        let remaining = window.readable_region().len();
        window.advance_read(remaining).unwrap();

        assert_eq!(&out, payload);
        assert!(window.is_empty());
    }

    #[test]
    fn test_backpressure_queries() {
        let mut window = ByteWindow::new(4).unwrap();

        assert!(window.has_writable());
        assert!(!window.has_readable());

        window.advance_write(4).unwrap();
        assert!(!window.has_writable());
        assert!(window.has_readable());

        window.advance_read(4).unwrap();
        assert!(window.has_writable());
        assert!(!window.has_readable());
    }
}
