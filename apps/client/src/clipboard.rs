//! Clipboard target for the copy action.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> std::io::Result<()>;
}

/// Sets the terminal's clipboard through an OSC 52 escape sequence.
///
/// The terminal decodes the payload itself, so this works over SSH and
/// without a display server. Terminals that ignore OSC 52 print nothing.
pub struct Osc52Clipboard<W> {
    out: Mutex<W>,
}

impl Osc52Clipboard<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Clipboard for Osc52Clipboard<W> {
    fn set_text(&self, text: &str) -> std::io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        write!(out, "\x1b]52;c;{}\x07", STANDARD.encode(text))?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence_carries_base64_text() {
        let clipboard = Osc52Clipboard::new(Vec::new());
        clipboard.set_text("Dear").unwrap();
        assert_eq!(clipboard.into_inner(), b"\x1b]52;c;RGVhcg==\x07");
    }

    #[test]
    fn test_multiline_letter_is_single_sequence() {
        let clipboard = Osc52Clipboard::new(Vec::new());
        clipboard.set_text("Dear Hiring Manager,\n\nRegards").unwrap();
        let written = String::from_utf8(clipboard.into_inner()).unwrap();
        assert!(written.starts_with("\x1b]52;c;"));
        assert!(written.ends_with('\x07'));
        assert!(!written.contains('\n'));
    }
}
