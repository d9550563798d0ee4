//! Project identity: name and the fixed set of class labels.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Number of classes every project is created with.
pub const CLASS_COUNT: usize = 3;

/// The ordered, fixed-size label set of a project.
///
/// Labels are addressed with 1-based indices on the wire (`class_num`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ClassLabels([String; CLASS_COUNT]);

impl ClassLabels {
    /// Create a label set from three labels.
    #[must_use]
    pub fn new(first: impl Into<String>, second: impl Into<String>, third: impl Into<String>) -> Self {
        Self([first.into(), second.into(), third.into()])
    }

    /// Look up a label by its 1-based class index.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ClassIndex`] if `class_num` is 0 or past the last label.
    pub fn label(&self, class_num: usize) -> SessionResult<&str> {
        class_num
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .map(String::as_str)
            .ok_or(SessionError::ClassIndex {
                index: class_num,
                count: CLASS_COUNT,
            })
    }

    /// Iterate labels in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Borrow the labels as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for ClassLabels {
    type Error = SessionError;

    fn try_from(labels: Vec<String>) -> SessionResult<Self> {
        let count = labels.len();
        let labels: [String; CLASS_COUNT] = labels.try_into().map_err(|_| {
            SessionError::Validation(format!(
                "expected {CLASS_COUNT} class labels, got {count}"
            ))
        })?;
        Ok(Self(labels))
    }
}

impl From<ClassLabels> for Vec<String> {
    fn from(labels: ClassLabels) -> Self {
        labels.0.into()
    }
}

impl fmt::Display for ClassLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

/// An opened project as the session sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Immutable project identifier.
    pub name: String,
    /// Class labels, fixed for the session.
    pub classes: ClassLabels,
    /// Whether the project is already durable on the backend.
    pub persisted: bool,
}

impl ProjectInfo {
    /// Create project info.
    #[must_use]
    pub fn new(name: impl Into<String>, classes: ClassLabels, persisted: bool) -> Self {
        Self {
            name: name.into(),
            classes,
            persisted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup_is_one_based() {
        let labels = ClassLabels::new("cat", "dog", "fish");
        assert_eq!(labels.label(1), Ok("cat"));
        assert_eq!(labels.label(3), Ok("fish"));
        assert_eq!(
            labels.label(0),
            Err(SessionError::ClassIndex { index: 0, count: 3 })
        );
        assert!(labels.label(4).is_err());
    }

    #[test]
    fn test_labels_from_vec_requires_three() {
        let ok = ClassLabels::try_from(vec!["a".to_string(), "b".into(), "c".into()]);
        assert!(ok.is_ok());

        let short = ClassLabels::try_from(vec!["a".to_string(), "b".into()]);
        assert!(matches!(short, Err(SessionError::Validation(_))));
    }

    #[test]
    fn test_labels_serde_as_list() {
        let labels = ClassLabels::new("x", "y", "z");
        let json = serde_json::to_string(&labels).expect("serialize");
        assert_eq!(json, r#"["x","y","z"]"#);

        let back: ClassLabels = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, labels);

        let bad: Result<ClassLabels, _> = serde_json::from_str(r#"["x"]"#);
        assert!(bad.is_err());
    }
}
