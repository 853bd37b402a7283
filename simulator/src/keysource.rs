//! Keyboard input abstraction, so the CPU loop never talks to a terminal
//! directly.
//!
//! `HostKeys` drives the real terminal through `crossterm`; `ScriptedKeys`
//! feeds a fixed byte sequence, for tests and the assembly-to-emulation
//! composition suite.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent};
use crossterm::terminal;

pub trait KeySource {
    /// Non-blocking: true if a keystroke is available without consuming it.
    fn has_key(&mut self) -> bool;
    /// Non-blocking: consumes and returns a pending keystroke, if any.
    fn take_key(&mut self) -> Option<u8>;
    /// Blocking: used by `GETC`/`IN`, which must wait for input.
    fn read_blocking(&mut self) -> io::Result<u8>;
}

/// Reads the real terminal in raw mode so keystrokes arrive unbuffered and
/// unechoed, matching the LC-3's TRAP-driven echo behavior.
pub struct HostKeys {
    pending: Option<u8>,
    raw_mode_entered: bool,
}

impl HostKeys {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            pending: None,
            raw_mode_entered: true,
        })
    }

    fn fill_pending(&mut self) {
        if self.pending.is_some() {
            return;
        }
        if let Ok(true) = event::poll(Duration::from_millis(0)) {
            if let Ok(Event::Key(KeyEvent {
                code: KeyCode::Char(c),
                ..
            })) = event::read()
            {
                self.pending = Some(c as u8);
            }
        }
    }
}

impl KeySource for HostKeys {
    fn has_key(&mut self) -> bool {
        self.fill_pending();
        self.pending.is_some()
    }

    fn take_key(&mut self) -> Option<u8> {
        self.fill_pending();
        self.pending.take()
    }

    fn read_blocking(&mut self) -> io::Result<u8> {
        loop {
            if let Some(byte) = self.take_key() {
                return Ok(byte);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

impl Drop for HostKeys {
    fn drop(&mut self) {
        if self.raw_mode_entered {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// A fixed, non-interactive source of keystrokes.
pub struct ScriptedKeys {
    queue: VecDeque<u8>,
}

impl ScriptedKeys {
    pub fn new(bytes: impl IntoIterator<Item = u8>) -> Self {
        Self {
            queue: bytes.into_iter().collect(),
        }
    }
}

impl KeySource for ScriptedKeys {
    fn has_key(&mut self) -> bool {
        !self.queue.is_empty()
    }

    fn take_key(&mut self) -> Option<u8> {
        self.queue.pop_front()
    }

    fn read_blocking(&mut self) -> io::Result<u8> {
        self.queue
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted input remaining"))
    }
}
