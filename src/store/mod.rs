//! Shortcode storage
//!
//! In-memory store of short URL records with lazy expiry and click tracking.
//! Randomness and time are injected so both can be replaced in tests.

pub mod clock;
pub mod generator;
pub mod models;
mod shortcode_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use generator::{CodeGenerator, RandomCodeGenerator, SequenceCodeGenerator};
pub use models::{ClickEvent, CreateShortUrl, Resolution, ShortUrlRecord, ShortUrlStats};
pub use shortcode_store::{
    DEFAULT_VALIDITY_MINUTES, GENERATED_SHORTCODE_LEN, MAX_GENERATION_ATTEMPTS, MSG_EXHAUSTED,
    MSG_INVALID_FORMAT, MSG_TAKEN, SHORTCODE_ALPHABET, ShortcodeStore, normalize_validity,
};
