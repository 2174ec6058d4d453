use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};

/// Arms the cooperative stop signal: `q` or ctrl-c flips the flag and the
/// listener exits. The engine only checks the flag between batches, so
/// in-flight probes still finish or time out naturally.
pub fn arm_stop_key(stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        if enable_raw_mode().is_err() {
            // Not a terminal (piped/CI); ctrl-c still kills the process.
            return;
        }

        loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    let is_q = key.code == KeyCode::Char('q');
                    let is_ctrl_c = key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL);

                    if is_q || is_ctrl_c {
                        stop.store(true, Ordering::Relaxed);
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }

        let _ = disable_raw_mode();
    });
}
