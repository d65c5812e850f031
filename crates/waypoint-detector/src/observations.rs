use serde::{Deserialize, Serialize};

/// One thing seen on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedItem {
    pub id: String,
    /// Where it was seen, for reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Previous id when the observer knows the item was renamed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<String>,
}

impl ObservedItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: None,
            renamed_from: None,
        }
    }

    #[must_use]
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn renamed_from(mut self, previous: impl Into<String>) -> Self {
        self.renamed_from = Some(previous.into());
        self
    }

    pub(crate) fn location(&self) -> String {
        self.path.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// Filesystem facts gathered by the caller.
///
/// `None` means the category was not observed at all (for example its directory does not
/// exist) and is left untouched. `Some(vec![])` means it was observed and is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observations {
    pub goals: Option<Vec<ObservedItem>>,
    pub workflows: Option<Vec<ObservedItem>>,
    pub integrations: Option<Vec<ObservedItem>>,
}

impl Observations {
    /// Observations listing only goal ids, the common case in tests and scripts
    pub fn with_goals<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            goals: Some(ids.into_iter().map(ObservedItem::new).collect()),
            ..Self::default()
        }
    }
}
