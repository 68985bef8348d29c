//! The rendering boundary.
//!
//! The session controller never touches a visual surface directly. It drives
//! an implementation of [`RenderBoundary`], which owns the two screens (setup
//! and chat), the transcript, the presence list and the message input.

pub mod terminal;

pub use terminal::TerminalRenderer;

use crate::protocol::Presence;

/// One line of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    /// A chat line, shown as `name: text` in the author's color.
    Message {
        display_name: String,
        color: String,
        text: String,
    },
    /// Join notice, styled as a system line.
    Join { text: String },
    /// Leave notice, styled as a system line.
    Leave { text: String },
}

/// Visible output driven by the session controller.
pub trait RenderBoundary {
    /// Show the name/color form and hide the chat.
    fn show_setup_screen(&mut self);

    /// Show the chat and hide the setup form.
    fn show_chat_screen(&mut self);

    fn focus_message_input(&mut self);

    /// Empty the message input after a successful send.
    fn clear_message_input(&mut self);

    /// Append one entry to the transcript.
    fn append_message(&mut self, entry: &TranscriptEntry);

    /// Replace the presence list (and its count) with `presence`.
    fn render_presence(&mut self, presence: &[Presence]);

    /// Remove every transcript entry.
    fn clear_transcript(&mut self);

    /// Show a non-blocking warning.
    fn warn(&mut self, text: &str);
}
