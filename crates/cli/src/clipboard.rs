//! Clipboard access through the terminal (OSC 52)

use base64::{engine::general_purpose::STANDARD, Engine};
use std::io::{self, Write};

/// Escape sequence asking the terminal to put `text` on the system clipboard
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

/// Copies `text` by writing the OSC 52 sequence to stdout
pub fn copy(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(osc52_sequence(text).as_bytes())?;
    stdout.flush()
}
