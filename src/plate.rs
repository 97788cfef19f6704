mod conditioning;
mod locator;
mod selector;

pub use conditioning::{condition, rescale_for_recognition};
pub use locator::locate;
pub use selector::{MIN_TEXT_LEN, TextCandidate, select, select_from};
