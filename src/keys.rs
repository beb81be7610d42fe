use crate::terminal::{self, NonBlocking, RawGuard, SessionError};
use std::os::unix::io::RawFd;

const ESCAPE_LOOKAHEAD: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Toggle,
    ToggleAll,
    Quit,
    StartFilter,
    Char(char),
    Backspace,
    Escape,
    Other,
}

pub trait ByteSource {
    // None on a zero-byte or interrupted read.
    fn read_byte(&mut self) -> Result<Option<u8>, SessionError>;

    fn read_pending(&mut self, buf: &mut [u8]) -> usize;

    fn begin_key(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn end_key(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

pub trait KeySource {
    fn next_key(&mut self) -> Result<Key, SessionError>;
}

pub struct TtySource {
    fd: RawFd,
    raw: Option<RawGuard>,
}

impl TtySource {
    pub fn stdin() -> Self {
        Self {
            fd: terminal::STDIN,
            raw: None,
        }
    }
}

impl ByteSource for TtySource {
    fn read_byte(&mut self) -> Result<Option<u8>, SessionError> {
        let mut byte = 0u8;
        // SAFETY: reads at most one byte into a live stack slot.
        let read = unsafe { libc::read(self.fd, (&mut byte as *mut u8).cast(), 1) };
        Ok((read == 1).then_some(byte))
    }

    fn read_pending(&mut self, buf: &mut [u8]) -> usize {
        let Ok(_nonblocking) = NonBlocking::enable(self.fd) else {
            return 0;
        };
        let mut filled = 0;
        while filled < buf.len() {
            // SAFETY: the slice bounds cap the write.
            let read = unsafe {
                libc::read(
                    self.fd,
                    buf[filled..].as_mut_ptr().cast(),
                    buf.len() - filled,
                )
            };
            if read <= 0 {
                break;
            }
            filled += read as usize;
        }
        filled
    }

    fn begin_key(&mut self) -> Result<(), SessionError> {
        self.raw = Some(RawGuard::enter(self.fd)?);
        Ok(())
    }

    fn end_key(&mut self) -> Result<(), SessionError> {
        match self.raw.take() {
            Some(guard) => guard.restore(),
            None => Ok(()),
        }
    }
}

pub struct KeyDecoder<S> {
    source: S,
    pending: Option<u8>,
}

impl<S: ByteSource> KeyDecoder<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pending: None,
        }
    }

    fn decode(&mut self) -> Result<Key, SessionError> {
        let byte = match self.pending.take() {
            Some(byte) => byte,
            None => match self.source.read_byte()? {
                Some(byte) => byte,
                None => return Ok(Key::Other),
            },
        };
        let key = match byte {
            0x03 | b'q' | b'Q' => Key::Quit,
            0x01 => Key::ToggleAll,
            0x06 => Key::StartFilter,
            b'k' | 0x10 => Key::Up,
            b'j' | 0x0E => Key::Down,
            0x00 | b' ' => Key::Toggle,
            b'\r' | b'\n' => {
                self.swallow_paired_newline(byte);
                Key::Enter
            }
            0x7F => Key::Backspace,
            0x1B => self.resolve_escape(),
            0x20..=0x7E => Key::Char(byte as char),
            _ => Key::Other,
        };
        Ok(key)
    }

    // CR LF and LF CR count as one Enter. Any other byte is kept for the
    // next key.
    fn swallow_paired_newline(&mut self, first: u8) {
        let partner = if first == b'\r' { b'\n' } else { b'\r' };
        let mut peek = [0u8; 1];
        if self.source.read_pending(&mut peek) == 1 && peek[0] != partner {
            self.pending = Some(peek[0]);
        }
    }

    fn resolve_escape(&mut self) -> Key {
        let mut buf = [0u8; ESCAPE_LOOKAHEAD];
        let read = self.source.read_pending(&mut buf);
        match &buf[..read] {
            [b'[', b'A', ..] => Key::Up,
            [b'[', b'B', ..] => Key::Down,
            _ => Key::Escape,
        }
    }
}

impl<S: ByteSource> KeySource for KeyDecoder<S> {
    fn next_key(&mut self) -> Result<Key, SessionError> {
        self.source.begin_key()?;
        let key = self.decode();
        let restored = self.source.end_key();
        let key = key?;
        restored?;
        Ok(key)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    // Bytes of one burst arrive together. An empty burst is one empty read.
    #[derive(Default)]
    pub(crate) struct Scripted {
        bursts: VecDeque<VecDeque<u8>>,
        started: bool,
        pub(crate) raw_depth: i32,
    }

    impl Scripted {
        pub(crate) fn new(bursts: &[&[u8]]) -> Self {
            Self {
                bursts: bursts.iter().map(|burst| burst.iter().copied().collect()).collect(),
                started: false,
                raw_depth: 0,
            }
        }
    }

    impl ByteSource for Scripted {
        fn read_byte(&mut self) -> Result<Option<u8>, SessionError> {
            while let Some(front) = self.bursts.front_mut() {
                if let Some(byte) = front.pop_front() {
                    self.started = true;
                    return Ok(Some(byte));
                }
                self.bursts.pop_front();
                if !std::mem::take(&mut self.started) {
                    return Ok(None);
                }
            }
            Ok(None)
        }

        fn read_pending(&mut self, buf: &mut [u8]) -> usize {
            let Some(front) = self.bursts.front_mut() else {
                return 0;
            };
            let mut filled = 0;
            while filled < buf.len() {
                match front.pop_front() {
                    Some(byte) => {
                        buf[filled] = byte;
                        filled += 1;
                    }
                    None => break,
                }
            }
            filled
        }

        fn begin_key(&mut self) -> Result<(), SessionError> {
            self.raw_depth += 1;
            Ok(())
        }

        fn end_key(&mut self) -> Result<(), SessionError> {
            self.raw_depth -= 1;
            Ok(())
        }
    }

    fn decode_all(bursts: &[&[u8]], count: usize) -> Vec<Key> {
        let mut decoder = KeyDecoder::new(Scripted::new(bursts));
        (0..count).map(|_| decoder.next_key().unwrap()).collect()
    }

    #[test]
    fn maps_control_bytes() {
        let keys = decode_all(
            &[b"\x03", b"\x01", b"\x06", b"\x10", b"\x0e", b"\x00", b"\x7f", b"\x08"],
            8,
        );
        assert_eq!(
            keys,
            vec![
                Key::Quit,
                Key::ToggleAll,
                Key::StartFilter,
                Key::Up,
                Key::Down,
                Key::Toggle,
                Key::Backspace,
                Key::Other,
            ]
        );
    }

    #[test]
    fn letter_bindings_take_precedence_over_chars() {
        let keys = decode_all(&[b"k", b"j", b" ", b"q", b"Q", b"x", b"I", b","], 8);
        assert_eq!(
            keys,
            vec![
                Key::Up,
                Key::Down,
                Key::Toggle,
                Key::Quit,
                Key::Quit,
                Key::Char('x'),
                Key::Char('I'),
                Key::Char(','),
            ]
        );
    }

    #[test]
    fn cursor_sequences_resolve_to_arrows() {
        let keys = decode_all(&[b"\x1b[A", b"\x1b[B", b"\x1b[C", b"\x1b", b"\x1bOA"], 5);
        assert_eq!(
            keys,
            vec![Key::Up, Key::Down, Key::Escape, Key::Escape, Key::Escape]
        );
    }

    #[test]
    fn escape_lookahead_leaves_next_keystroke_alone() {
        let keys = decode_all(&[b"\x1b", b"x"], 2);
        assert_eq!(keys, vec![Key::Escape, Key::Char('x')]);
    }

    #[test]
    fn paired_newlines_count_once() {
        let keys = decode_all(&[b"\r\n", b"\n\r", b"x"], 3);
        assert_eq!(keys, vec![Key::Enter, Key::Enter, Key::Char('x')]);
    }

    #[test]
    fn unpaired_peeked_byte_is_kept() {
        let keys = decode_all(&[b"\rx", b"\n\n"], 4);
        assert_eq!(keys, vec![Key::Enter, Key::Char('x'), Key::Enter, Key::Enter]);
    }

    #[test]
    fn empty_reads_are_never_fatal() {
        let mut decoder = KeyDecoder::new(Scripted::new(&[]));
        for _ in 0..100 {
            assert_eq!(decoder.next_key().unwrap(), Key::Other);
        }
        assert_eq!(decoder.source.raw_depth, 0);
    }

    #[test]
    fn decoding_resumes_after_an_empty_read() {
        let keys = decode_all(&[b"j", b"", b"\x1b[A", b"", b"\r"], 5);
        assert_eq!(keys, vec![Key::Down, Key::Other, Key::Up, Key::Other, Key::Enter]);
    }

    #[test]
    fn raw_mode_is_bracketed_per_key() {
        let mut decoder = KeyDecoder::new(Scripted::new(&[b"\x1b[A", b"\r"]));
        decoder.next_key().unwrap();
        assert_eq!(decoder.source.raw_depth, 0);
        decoder.next_key().unwrap();
        assert_eq!(decoder.source.raw_depth, 0);
    }
}
