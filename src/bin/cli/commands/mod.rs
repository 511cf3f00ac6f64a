pub mod cards;
pub mod plan;
pub mod prefs;
