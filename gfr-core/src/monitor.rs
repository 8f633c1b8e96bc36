//! Keyboard quit monitor for watch mode
//!
//! While watch mode runs, stdin is switched to non-canonical, non-echoing,
//! non-blocking input so a single `q` keypress stops the run. Signal
//! generation is left on, so Ctrl+C keeps reaching the interrupt handler.
//!
//! The original terminal mode is restored when the guard drops (including
//! during unwinding) and, as a last resort, by an `atexit` hook registered
//! the first time the mode is changed.

use std::io;
use std::sync::Once;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::tty::IsTty;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cancel::StopFlag;
use crate::constants::{timing, QUIT_KEY};

lazy_static! {
    static ref SAVED_TERMIOS: Mutex<Option<libc::termios>> = Mutex::new(None);
}

static ATEXIT_HOOK: Once = Once::new();

extern "C" fn restore_terminal_at_exit() {
    // Never block at exit; a holder of the lock restores on its own
    if let Some(mut saved) = SAVED_TERMIOS.try_lock() {
        if let Some(termios) = saved.take() {
            // SAFETY: termios was read from this fd by tcgetattr.
            unsafe {
                libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &termios);
            }
        }
    }
}

fn restore_saved_mode() {
    if let Some(termios) = SAVED_TERMIOS.lock().take() {
        // SAFETY: termios was read from this fd by tcgetattr.
        let ret = unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &termios) };
        if ret != 0 {
            debug!("failed to restore terminal mode: {}", io::Error::last_os_error());
        }
    }
}

/// Holds stdin in quit-key mode until dropped
#[derive(Debug)]
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    /// Save the current stdin mode and switch to non-canonical input
    pub fn enter() -> io::Result<Self> {
        // SAFETY: termios is plain old data and fully written by tcgetattr.
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        // SAFETY: STDIN_FILENO is always a valid descriptor number.
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &mut original) } != 0 {
            return Err(io::Error::last_os_error());
        }

        *SAVED_TERMIOS.lock() = Some(original);
        ATEXIT_HOOK.call_once(|| {
            // SAFETY: the hook is a plain extern "C" fn with no captured state.
            if unsafe { libc::atexit(restore_terminal_at_exit) } != 0 {
                debug!("could not register terminal restore hook");
            }
        });

        let mut quiet = original;
        quiet.c_lflag &= !(libc::ICANON | libc::ECHO);
        quiet.c_cc[libc::VMIN] = 0;
        quiet.c_cc[libc::VTIME] = 0;

        // SAFETY: quiet is a valid termios derived from the current mode.
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &quiet) } != 0 {
            let err = io::Error::last_os_error();
            SAVED_TERMIOS.lock().take();
            return Err(err);
        }

        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_saved_mode();
    }
}

/// True for a press of `quit` in either case
pub fn is_quit_key(key: &KeyEvent, quit: char) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char(c) => c.eq_ignore_ascii_case(&quit),
        _ => false,
    }
}

/// Sets the stop flag when the quit key is pressed
#[derive(Debug, Clone)]
pub struct KeyboardMonitor {
    stop: StopFlag,
    poll_interval: Duration,
    quit_key: char,
}

impl KeyboardMonitor {
    pub fn new(stop: StopFlag) -> Self {
        Self {
            stop,
            poll_interval: timing::KEY_POLL_INTERVAL,
            quit_key: QUIT_KEY,
        }
    }

    /// Run until the quit key is pressed or the stop flag is set elsewhere.
    ///
    /// Returns at once if stdin is not a terminal or its mode cannot be
    /// changed; the interrupt signal is then the only way to stop.
    pub fn run(&self) {
        if !io::stdin().is_tty() {
            debug!("stdin is not a terminal, keyboard monitor disabled");
            return;
        }

        let _guard = match TerminalGuard::enter() {
            Ok(guard) => guard,
            Err(e) => {
                debug!("cannot switch terminal mode ({}), keyboard monitor disabled", e);
                return;
            }
        };

        while !self.stop.is_set() {
            match event::poll(self.poll_interval) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if is_quit_key(&key, self.quit_key) => {
                        info!("quit key pressed");
                        self.stop.set();
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("keyboard read failed: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    debug!("keyboard poll failed: {}", e);
                    break;
                }
            }
        }
    }
}
