pub mod identify;
pub mod signature;
pub mod transform;

pub use identify::{identify, ChosenFrame};
pub use signature::Locale;
pub use transform::{apply_mapping, build_mapping, LetterMapping};
