pub mod settings;

pub use settings::{IntegrityPolicy, Settings};
