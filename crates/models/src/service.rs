use serde::{Deserialize, Serialize};

use crate::errors::{require, ModelError};
use crate::record::{null_as_empty, Collection, Draft, OrderIndex, Record, RecordId};

/// An offered service shown on the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Emoji or short icon name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub icon: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub order_index: OrderIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub link: String,
    pub order_index: OrderIndex,
}

impl Draft for ServiceDraft {
    fn validate(&self) -> Result<(), ModelError> {
        require("title", &self.title)?;
        require("description", &self.description)?;
        require("icon", &self.icon)?;
        Ok(())
    }
}

impl Record for Service {
    const COLLECTION: Collection = Collection::Services;
    type Draft = ServiceDraft;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn order_index(&self) -> OrderIndex {
        self.order_index
    }

    fn to_draft(&self) -> ServiceDraft {
        ServiceDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            link: self.link.clone().unwrap_or_default(),
            order_index: self.order_index.seeded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sort_for_display;
    use serde_json::json;

    fn svc(id: &str, order: Option<i64>) -> Service {
        serde_json::from_value(json!({
            "id": id, "title": id, "description": "d", "icon": "*", "order_index": order
        }))
        .unwrap()
    }

    #[test]
    fn icon_is_required() {
        let d = ServiceDraft { title: "Web".into(), description: "Sites".into(), ..Default::default() };
        assert_eq!(d.validate(), Err(ModelError::MissingField("icon")));
    }

    #[test]
    fn display_sort_is_stable_with_nan_last() {
        let mut list = vec![svc("a", None), svc("b", Some(2)), svc("c", Some(1)), svc("d", Some(2))];
        sort_for_display(&mut list);
        let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "d", "a"]);
    }
}
