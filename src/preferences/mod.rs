//! Remembered UI defaults: last course, preferred note method, recent courses

mod models;
mod storage;

pub use models::*;
pub use storage::PreferenceContext;
