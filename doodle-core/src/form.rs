//! Local validation for the project setup and project load forms.
//!
//! Both forms are forwarded verbatim to the backend once they pass these
//! checks; nothing here talks to the network.

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};
use crate::project::ClassLabels;

/// Fields collected when creating a new project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSetup {
    /// Requested project name.
    pub name: String,
    /// The three class names, in order.
    pub classes: [String; 3],
    /// Create the project as durable right away.
    #[serde(default)]
    pub persistent: bool,
}

impl ProjectSetup {
    /// Check that every field is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] naming the first empty field.
    pub fn validate(&self) -> SessionResult<ClassLabels> {
        if self.name.trim().is_empty() {
            return Err(SessionError::Validation(
                "Please enter a project name.".to_string(),
            ));
        }
        for (i, class) in self.classes.iter().enumerate() {
            if class.trim().is_empty() {
                return Err(SessionError::Validation(format!(
                    "Please enter a name for class {}.",
                    i + 1
                )));
            }
        }
        let [a, b, c] = self.classes.clone();
        Ok(ClassLabels::new(a, b, c))
    }
}

/// Fields collected when loading an existing project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLoad {
    /// Name of the stored project.
    pub name: String,
    /// Optional class names to check against the stored ones.
    #[serde(default)]
    pub classes: [String; 3],
}

impl ProjectLoad {
    /// Check the name and decide whether class names are sent.
    ///
    /// Class names only take part in validation when all three are filled in;
    /// a partially filled set is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] if the name is empty.
    pub fn validate(&self) -> SessionResult<Option<ClassLabels>> {
        if self.name.trim().is_empty() {
            return Err(SessionError::Validation(
                "Please enter a project name.".to_string(),
            ));
        }
        if self.classes.iter().all(|c| !c.trim().is_empty()) {
            let [a, b, c] = self.classes.clone();
            Ok(Some(ClassLabels::new(a, b, c)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(a: &str, b: &str, c: &str) -> [String; 3] {
        [a.to_string(), b.to_string(), c.to_string()]
    }

    #[test]
    fn test_setup_requires_name() {
        let setup = ProjectSetup {
            name: "  ".into(),
            classes: classes("a", "b", "c"),
            persistent: false,
        };
        assert!(matches!(setup.validate(), Err(SessionError::Validation(_))));
    }

    #[test]
    fn test_setup_requires_every_class() {
        let setup = ProjectSetup {
            name: "digits".into(),
            classes: classes("zero", "", "two"),
            persistent: false,
        };
        let err = setup.validate().unwrap_err();
        assert_eq!(
            err,
            SessionError::Validation("Please enter a name for class 2.".into())
        );
    }

    #[test]
    fn test_setup_yields_labels() {
        let setup = ProjectSetup {
            name: "digits".into(),
            classes: classes("zero", "one", "two"),
            persistent: true,
        };
        let labels = setup.validate().expect("valid");
        assert_eq!(labels.label(2), Ok("one"));
    }

    #[test]
    fn test_load_ignores_partial_classes() {
        let load = ProjectLoad {
            name: "digits".into(),
            classes: classes("zero", "", ""),
        };
        assert_eq!(load.validate(), Ok(None));
    }

    #[test]
    fn test_load_forwards_full_classes() {
        let load = ProjectLoad {
            name: "digits".into(),
            classes: classes("zero", "one", "two"),
        };
        let labels = load.validate().expect("valid").expect("classes");
        assert_eq!(labels.label(3), Ok("two"));
    }

    #[test]
    fn test_load_requires_name() {
        assert!(ProjectLoad::default().validate().is_err());
    }
}
