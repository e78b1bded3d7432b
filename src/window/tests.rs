//! Tests for the byte window

#[cfg(test)]
mod tests {
    use crate::window::ByteWindow;

    #[test]
    fn test_window_basic() {
        let mut window = ByteWindow::new(8).unwrap();

        assert_eq!(window.capacity(), 8);
        assert!(window.is_empty());
        assert!(window.has_writable());
        assert!(!window.has_readable());

        window.writable_region()[..3].copy_from_slice(b"abc");
        window.advance_write(3).unwrap();

        assert_eq!(window.len(), 3);
        assert_eq!(window.readable_region(), b"abc");
        assert!(window.has_readable());
    }

    #[test]
    fn test_window_rejects_zero_capacity() {
        assert!(ByteWindow::new(0).is_err());
    }

    #[test]
    fn test_window_advance_bounds() {
        let mut window = ByteWindow::new(4).unwrap();

        assert!(window.advance_write(5).is_err());
        window.advance_write(4).unwrap();
        assert!(window.is_full());
        assert!(!window.has_writable());

        assert!(window.advance_read(5).is_err());
        window.advance_read(2).unwrap();
        // partially drained: writable space only reopens on full drain
        assert!(!window.has_writable());
        window.advance_read(2).unwrap();
        assert!(window.is_empty());
        assert_eq!(window.writable_len(), 4);
    }

    #[test]
    fn test_window_cursor_reset_on_drain() {
        let mut window = ByteWindow::new(4).unwrap();

        window.writable_region()[..2].copy_from_slice(b"hi");
        window.advance_write(2).unwrap();
        window.advance_read(2).unwrap();

        // cursors snapped back to the front
        assert_eq!(window.writable_len(), 4);
        window.writable_region()[..4].copy_from_slice(b"full");
        window.advance_write(4).unwrap();
        assert_eq!(window.readable_region(), b"full");
    }

    #[test]
    fn test_window_clear() {
        let mut window = ByteWindow::new(4).unwrap();

        window.writable_region()[..3].copy_from_slice(b"xyz");
        window.advance_write(3).unwrap();
        window.clear();

        assert!(window.is_empty());
        assert_eq!(window.writable_len(), 4);
    }
}
