use serde::{Deserialize, Serialize};

use crate::errors::{require, ModelError};
use crate::record::{null_as_empty, Collection, Draft, OrderIndex, Record, RecordId};

/// A portfolio project card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Public URL of the uploaded background image.
    #[serde(default)]
    pub bg_image: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub order_index: OrderIndex,
}

/// Working copy of a project under edit. Absent optional fields are empty
/// strings, and the whole draft is the save payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub bg_image: String,
    pub link: String,
    pub order_index: OrderIndex,
}

impl Draft for ProjectDraft {
    fn validate(&self) -> Result<(), ModelError> {
        require("title", &self.title)?;
        require("description", &self.description)?;
        Ok(())
    }
}

impl Record for Project {
    const COLLECTION: Collection = Collection::Projects;
    type Draft = ProjectDraft;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn order_index(&self) -> OrderIndex {
        self.order_index
    }

    fn to_draft(&self) -> ProjectDraft {
        ProjectDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            bg_image: self.bg_image.clone().unwrap_or_default(),
            link: self.link.clone().unwrap_or_default(),
            order_index: self.order_index.seeded(),
        }
    }
}
