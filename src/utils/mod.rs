pub mod logging;

pub use logging::{clip_chars, truncate_text};
