use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use std::cell::UnsafeCell;
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

pub const STDIN: RawFd = libc::STDIN_FILENO;
pub const INTERRUPT_EXIT_CODE: i32 = 128 + libc::SIGINT;

// Show cursor, leave alternate screen.
const RESTORE_SEQUENCE: &[u8] = b"\x1b[?25h\x1b[?1049l";

const FALLBACK_COLUMNS: u16 = 80;
const FALLBACK_ROWS: u16 = 24;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("standard input is not a terminal")]
    NotATty,
    #[error("failed to read terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),
    #[error("failed to apply terminal attributes: {0}")]
    SetAttributes(#[source] io::Error),
    #[error("failed to install interrupt handler: {0}")]
    Signal(#[source] io::Error),
    #[error("failed to write to terminal: {0}")]
    Io(#[from] io::Error),
}

/// Cooked attributes shared with the interrupt handler. The picker loop is
/// the only writer and publishes before every blocking read; `ready` is
/// false while a write is in progress, and the handler skips restoring then.
pub struct SnapshotCell {
    ready: AtomicBool,
    value: UnsafeCell<MaybeUninit<libc::termios>>,
}

// SAFETY: access follows the single-writer discipline documented above.
unsafe impl Sync for SnapshotCell {}

impl SnapshotCell {
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    pub fn publish(&self, termios: &libc::termios) {
        self.ready.store(false, Ordering::SeqCst);
        // SAFETY: only the picker thread writes and readers check `ready`.
        unsafe {
            (*self.value.get()).write(*termios);
        }
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn load(&self) -> Option<libc::termios> {
        if !self.ready.load(Ordering::SeqCst) {
            return None;
        }
        // SAFETY: `ready` is only set after a complete write.
        Some(unsafe { (*self.value.get()).assume_init_read() })
    }

    pub fn clear(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }
}

static COOKED: SnapshotCell = SnapshotCell::new();

pub fn publish_cooked(termios: &libc::termios) {
    COOKED.publish(termios);
}

pub fn get_attributes(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: tcgetattr fully initialises the struct on success.
    unsafe {
        if libc::tcgetattr(fd, termios.as_mut_ptr()) != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(termios.assume_init())
    }
}

pub fn set_attributes(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    // SAFETY: plain syscall on a borrowed, initialised struct.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

// Async-signal context: syscalls only, no allocation, no locks.
extern "C" fn on_interrupt(_signal: libc::c_int) {
    if let Some(termios) = COOKED.load() {
        // SAFETY: tcsetattr, write and _exit are async-signal-safe.
        unsafe {
            libc::tcsetattr(STDIN, libc::TCSANOW, &termios);
        }
    }
    unsafe {
        libc::write(
            libc::STDERR_FILENO,
            RESTORE_SEQUENCE.as_ptr().cast(),
            RESTORE_SEQUENCE.len(),
        );
        libc::_exit(INTERRUPT_EXIT_CODE);
    }
}

fn install_interrupt_handler() -> io::Result<libc::sigaction> {
    // SAFETY: zeroed sigaction structs are valid and filled in below.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = 0;
        let mut previous: libc::sigaction = std::mem::zeroed();
        if libc::sigaction(libc::SIGINT, &action, &mut previous) != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(previous)
    }
}

fn restore_interrupt_handler(previous: &libc::sigaction) {
    // SAFETY: `previous` came from a successful sigaction call.
    unsafe {
        libc::sigaction(libc::SIGINT, previous, ptr::null_mut());
    }
}

pub struct TerminalSession {
    cooked: libc::termios,
    previous_action: libc::sigaction,
    released: bool,
}

impl TerminalSession {
    pub fn acquire() -> Result<Self, SessionError> {
        // SAFETY: isatty only inspects the descriptor.
        if unsafe { libc::isatty(STDIN) } == 0 {
            return Err(SessionError::NotATty);
        }
        let cooked = get_attributes(STDIN).map_err(SessionError::GetAttributes)?;
        publish_cooked(&cooked);
        let previous_action = install_interrupt_handler().map_err(SessionError::Signal)?;
        let session = Self {
            cooked,
            previous_action,
            released: false,
        };
        execute!(io::stderr(), EnterAlternateScreen, cursor::Hide)?;
        debug!("terminal session acquired");
        Ok(session)
    }

    pub fn release(mut self) -> Result<(), SessionError> {
        self.restore()
    }

    fn restore(&mut self) -> Result<(), SessionError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let attributes = set_attributes(STDIN, &self.cooked).map_err(SessionError::SetAttributes);
        let screen = execute!(io::stderr(), cursor::Show, LeaveAlternateScreen);
        restore_interrupt_handler(&self.previous_action);
        COOKED.clear();
        debug!("terminal session released");
        attributes?;
        screen?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

// Canonical mode and echo off, ISIG left on.
pub struct RawGuard {
    fd: RawFd,
    saved: libc::termios,
    restored: bool,
}

impl RawGuard {
    pub fn enter(fd: RawFd) -> Result<Self, SessionError> {
        let saved = get_attributes(fd).map_err(SessionError::GetAttributes)?;
        publish_cooked(&saved);
        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        set_attributes(fd, &raw).map_err(SessionError::SetAttributes)?;
        Ok(Self {
            fd,
            saved,
            restored: false,
        })
    }

    pub fn restore(mut self) -> Result<(), SessionError> {
        self.restored = true;
        set_attributes(self.fd, &self.saved).map_err(SessionError::SetAttributes)
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        if !self.restored {
            let _ = set_attributes(self.fd, &self.saved);
        }
    }
}

pub struct NonBlocking {
    fd: RawFd,
    flags: libc::c_int,
}

impl NonBlocking {
    pub fn enable(fd: RawFd) -> io::Result<Self> {
        // SAFETY: fcntl on a borrowed descriptor.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { fd, flags })
    }
}

impl Drop for NonBlocking {
    fn drop(&mut self) {
        // SAFETY: restores the flags read in `enable`.
        unsafe {
            libc::fcntl(self.fd, libc::F_SETFL, self.flags);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub columns: u16,
    pub rows: u16,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            columns: FALLBACK_COLUMNS,
            rows: FALLBACK_ROWS,
        }
    }
}

pub fn window_size() -> WindowSize {
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };
    // SAFETY: TIOCGWINSZ writes into the provided winsize.
    let result = unsafe { libc::ioctl(libc::STDERR_FILENO, libc::TIOCGWINSZ, &mut size) };
    let fallback = WindowSize::default();
    if result != 0 {
        return fallback;
    }
    WindowSize {
        columns: if size.ws_col == 0 { fallback.columns } else { size.ws_col },
        rows: if size.ws_row == 0 { fallback.rows } else { size.ws_row },
    }
}
