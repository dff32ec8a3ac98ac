//! Evidence items collected during a run.

use serde::{Deserialize, Serialize};

/// An object the player picked up along the way.
///
/// Item ids are provider-assigned strings, not uuids - the narrative provider
/// names items and later refers back to them by the same id when one is
/// consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: ItemKind,
}

/// Category of an evidence item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Document,
    Key,
    Charm,
    Tool,
    /// Unknown kind for forward compatibility
    #[serde(other)]
    #[default]
    Other,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Key => write!(f, "key"),
            Self::Charm => write!(f, "charm"),
            Self::Tool => write!(f, "tool"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "key" => Ok(Self::Key),
            "charm" => Ok(Self::Charm),
            "tool" => Ok(Self::Tool),
            _ => Ok(Self::Other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_deserializes_to_other() {
        let item: EvidenceItem =
            serde_json::from_str(r#"{"id":"i1","name":"thing","kind":"weapon"}"#)
                .expect("valid item json");
        assert_eq!(item.kind, ItemKind::Other);
    }

    #[test]
    fn missing_optional_fields_default() {
        let item: EvidenceItem =
            serde_json::from_str(r#"{"id":"i2","name":"torn page"}"#).expect("valid item json");
        assert_eq!(item.description, "");
        assert_eq!(item.kind, ItemKind::Other);
    }
}
