use std::path::{Path, PathBuf};

use super::models::{Preferences, PreferencesPatch};
use crate::storage::Result;

/// Preference state owned by the caller and passed to whoever needs it
///
/// Nothing is read or written implicitly: `load` reads the file once and
/// `save` writes it back when something changed.
#[derive(Debug)]
pub struct PreferenceContext {
    path: PathBuf,
    prefs: Preferences,
    dirty: bool,
}

impl PreferenceContext {
    /// Load preferences from file; a missing or unreadable file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        let prefs = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            match serde_json::from_str(&data) {
                Ok(prefs) => prefs,
                Err(e) => {
                    log::warn!("Ignoring unreadable preferences {:?}: {}", path, e);
                    Preferences::default()
                }
            }
        } else {
            Preferences::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            prefs,
            dirty: false,
        })
    }

    /// Snapshot of the current preferences
    pub fn get(&self) -> Preferences {
        self.prefs.clone()
    }

    pub fn set(&mut self, patch: PreferencesPatch) {
        self.prefs.merge(patch);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Save preferences to file if they changed since load, replacing it in one rename
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.prefs)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.path)?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let ctx = PreferenceContext::load(&dir.path().join("preferences.json")).unwrap();
        assert_eq!(ctx.get(), Preferences::default());
        assert!(!ctx.is_dirty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let mut ctx = PreferenceContext::load(&path).unwrap();
        ctx.set(PreferencesPatch {
            last_course: Some("chem-201".to_string()),
            preferred_note_method: Some("outline".to_string()),
            ..PreferencesPatch::default()
        });
        assert!(ctx.is_dirty());
        ctx.save().unwrap();
        assert!(!ctx.is_dirty());

        let reloaded = PreferenceContext::load(&path).unwrap().get();
        assert_eq!(reloaded.last_course.as_deref(), Some("chem-201"));
        assert_eq!(reloaded.preferred_note_method.as_deref(), Some("outline"));
        assert_eq!(reloaded.recent_courses, vec!["chem-201"]);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let ctx = PreferenceContext::load(&path).unwrap();
        assert_eq!(ctx.get(), Preferences::default());
    }

    #[test]
    fn test_save_replaces_file_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{\"lastCourse\": \"Old\"}").unwrap();

        let mut ctx = PreferenceContext::load(&path).unwrap();
        ctx.set(PreferencesPatch {
            last_course: Some("Biology".to_string()),
            ..PreferencesPatch::default()
        });
        ctx.save().unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("preferences.json")]);

        let reloaded = PreferenceContext::load(&path).unwrap();
        assert_eq!(reloaded.get().last_course.as_deref(), Some("Biology"));
    }
}
