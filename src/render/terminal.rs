//! A [`RenderBoundary`] that writes styled lines to a terminal.
//!
//! Participant colors given as `#rgb` or `#rrggbb` are rendered with 24-bit
//! ANSI escapes when styling is enabled; anything else is printed unstyled.

use std::io::Write;

use tracing::warn;

use super::{RenderBoundary, TranscriptEntry};
use crate::protocol::Presence;

const RESET: &str = "\x1b[0m";
const DIM_ITALIC: &str = "\x1b[2;3m";
const BOLD: &str = "\x1b[1m";
const YELLOW: &str = "\x1b[33m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Parse `#rgb` or `#rrggbb` into RGB components.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>, scale: u8| -> Option<u8> {
        let digits = hex.get(range)?;
        u8::from_str_radix(digits, 16).ok().map(|v| v * scale)
    };
    match hex.len() {
        3 => Some((channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?)),
        6 => Some((channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?)),
        _ => None,
    }
}

/// Writes the chat to any [`Write`] sink, typically stdout.
#[derive(Debug)]
pub struct TerminalRenderer<W: Write> {
    out: W,
    styled: bool,
    in_chat: bool,
    transcript_len: usize,
}

impl<W: Write> TerminalRenderer<W> {
    /// Create a renderer. `styled` enables ANSI colors and screen clearing.
    pub fn new(out: W, styled: bool) -> Self {
        Self {
            out,
            styled,
            in_chat: false,
            transcript_len: 0,
        }
    }

    /// Returns `true` while the chat screen is shown.
    pub fn in_chat(&self) -> bool {
        self.in_chat
    }

    /// Entries appended since the transcript was last cleared.
    pub fn transcript_len(&self) -> usize {
        self.transcript_len
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, color: &str) -> String {
        match (self.styled, parse_hex_color(color)) {
            (true, Some((r, g, b))) => format!("\x1b[38;2;{r};{g};{b}m{text}{RESET}"),
            _ => text.to_owned(),
        }
    }

    fn style(&self, text: &str, escape: &str) -> String {
        if self.styled {
            format!("{escape}{text}{RESET}")
        } else {
            text.to_owned()
        }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            warn!("terminal write failed: {e}");
        }
    }
}

impl<W: Write> RenderBoundary for TerminalRenderer<W> {
    fn show_setup_screen(&mut self) {
        self.in_chat = false;
        let title = self.style("== Join the chat ==", BOLD);
        self.line(&title);
        self.line("Enter a display name (optionally followed by a #color):");
    }

    fn show_chat_screen(&mut self) {
        self.in_chat = true;
        let title = self.style("== Chat ==", BOLD);
        self.line(&title);
        self.line("Type a message and press Enter. /leave to leave, /quit to exit.");
    }

    fn focus_message_input(&mut self) {
        // A terminal always reads from the same prompt.
    }

    fn clear_message_input(&mut self) {}

    fn append_message(&mut self, entry: &TranscriptEntry) {
        let text = match entry {
            TranscriptEntry::Message {
                display_name,
                color,
                text,
            } => format!("{} {text}", self.paint(&format!("{display_name}:"), color)),
            TranscriptEntry::Join { text } | TranscriptEntry::Leave { text } => {
                self.style(&format!("* {text}"), DIM_ITALIC)
            }
        };
        self.transcript_len += 1;
        self.line(&text);
    }

    fn render_presence(&mut self, presence: &[Presence]) {
        let names: Vec<String> = presence
            .iter()
            .map(|p| self.paint(&p.display_name, &p.color))
            .collect();
        let text = format!("Users ({}): {}", presence.len(), names.join(", "));
        self.line(&text);
    }

    fn clear_transcript(&mut self) {
        self.transcript_len = 0;
        if self.styled {
            if let Err(e) = write!(self.out, "{CLEAR_SCREEN}") {
                warn!("terminal write failed: {e}");
            }
        }
    }

    fn warn(&mut self, text: &str) {
        let text = self.style(&format!("! {text}"), YELLOW);
        self.line(&text);
    }
}
