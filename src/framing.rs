//! Delimiter framing of the text arriving on a link.
//!
//! Text is accumulated until one of the two delimiter tokens shows up, at which
//! point the buffered content is flushed as a single [`DecodedMessage`]. The
//! payload handed downstream is percent-encoded; see [`escape`] for the exact
//! alphabet.

mod assembler;
mod escape;
mod message;

pub use assembler::FrameAssembler;
pub use escape::{escape, unescape};
pub use message::{DecodedMessage, MessageKind};
