use serde::{Deserialize, Serialize};

/// Number of courses kept in the recent list
pub const RECENT_COURSES_LIMIT: usize = 5;

/// UI defaults remembered between sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_note_method: Option<String>,
    /// Most recent first
    pub recent_courses: Vec<String>,
}

/// Partial update of preferences; `None` fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    pub last_course: Option<String>,
    pub preferred_note_method: Option<String>,
    pub recent_courses: Option<Vec<String>>,
}

impl Preferences {
    /// Merge a patch, last write wins. Setting a course also bumps it in the recent list.
    pub fn merge(&mut self, patch: PreferencesPatch) {
        if let Some(recent) = patch.recent_courses {
            self.recent_courses.clear();
            for course in recent {
                if !self.recent_courses.contains(&course) {
                    self.recent_courses.push(course);
                }
            }
            self.recent_courses.truncate(RECENT_COURSES_LIMIT);
        }
        if let Some(method) = patch.preferred_note_method {
            self.preferred_note_method = Some(method);
        }
        if let Some(course) = patch.last_course {
            self.push_recent(&course);
            self.last_course = Some(course);
        }
    }

    fn push_recent(&mut self, course: &str) {
        self.recent_courses.retain(|c| c != course);
        self.recent_courses.insert(0, course.to_string());
        self.recent_courses.truncate(RECENT_COURSES_LIMIT);
    }
}
