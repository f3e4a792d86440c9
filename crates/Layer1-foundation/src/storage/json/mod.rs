//! JSON 저장소

mod store;

pub use store::{load_file, JsonStore};
