use serde::{Deserialize, Serialize};

/// A stored book. The identifier is assigned by the store on insert and is
/// immutable afterwards; it doubles as the MongoDB `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier for the book
    #[serde(rename = "_id")]
    pub id: String,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Short plot summary, if one was provided
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

/// Request model for creating a new book. No client-supplied id is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Short plot summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

/// Sparse patch for a book. Only fields that are present and non-null are
/// applied; a null or absent field leaves the stored value untouched. There
/// is no way to clear a field through this model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

impl BookUpdate {
    /// True when no field carries a value, i.e. the patch is a no-op.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.synopsis.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_id_serializes_as_underscore_id() {
        let book = Book {
            id: "abc".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            synopsis: None,
        };

        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["_id"], "abc");
        assert!(value.get("id").is_none());
        // Absent synopsis is omitted, not serialized as null
        assert!(value.get("synopsis").is_none());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(BookUpdate::default().is_empty());

        let patch: BookUpdate = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());

        let patch: BookUpdate =
            serde_json::from_str(r#"{"title": null, "author": null, "synopsis": null}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn partial_patch_is_not_empty() {
        let patch: BookUpdate = serde_json::from_str(r#"{"synopsis": "new"}"#).unwrap();
        assert!(!patch.is_empty());
        assert_eq!(patch.synopsis.as_deref(), Some("new"));
        assert!(patch.title.is_none());
    }
}
