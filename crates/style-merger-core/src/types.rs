use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Stable host identifier of a style
    StyleId
);
string_id!(
    /// Stable host identifier of a canvas element
    ElementId
);
string_id!(
    /// Stable host identifier of a component definition
    ComponentId
);

/// RGBA color as reported for color variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorValue {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
}

/// Value of a single style property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Plain CSS value, e.g. `"red"` or `"12px"`
    Literal(String),

    /// Reference to a shared design variable
    Variable {
        #[serde(rename = "variableId")]
        variable_id: String,
    },

    /// Resolved color variable
    Color(ColorValue),
}

impl PropertyValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn variable(variable_id: impl Into<String>) -> Self {
        Self::Variable {
            variable_id: variable_id.into(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.write_str(value),
            Self::Variable { variable_id } => write!(f, "var({})", variable_id),
            Self::Color(c) => match c.a {
                Some(a) => write!(f, "rgba({}, {}, {}, {})", c.r, c.g, c.b, a),
                None => write!(f, "rgb({}, {}, {})", c.r, c.g, c.b),
            },
        }
    }
}

/// Property name to value mapping owned by a style
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A style handle annotated with its freshly resolved name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedStyle {
    pub id: StyleId,
    pub name: String,
}

impl NamedStyle {
    pub fn new(id: impl Into<StyleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<String> for StyleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Styles sharing a base name once trailing ` <number>` suffixes are stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleGroup {
    pub base_name: String,
    pub styles: Vec<NamedStyle>,
}

/// One property that differs between two styles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDifference {
    pub property: String,
    pub base: Option<PropertyValue>,
    pub other: Option<PropertyValue>,
}

/// Summary of a canvas element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub element_type: String,
}

/// A duplicate style that was fully folded into its base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedStyle {
    pub style: StyleId,
    pub elements_repointed: usize,
}

/// Result of executing a merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Whether every duplicate was merged and deleted
    pub success: bool,

    /// Optional error message if the merge stopped early
    pub error: Option<String>,

    /// Duplicates merged and deleted, in execution order
    pub merged: Vec<MergedStyle>,

    /// Duplicate on which the batch stopped
    pub failed: Option<StyleId>,

    /// Element repoints undone for the failed duplicate
    pub rolled_back: usize,

    /// Elements whose last change timed out, left untouched by rollback
    #[serde(default)]
    pub unsettled: Vec<ElementId>,
}

/// Outcome of a user-facing action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action was successful
    pub success: bool,

    /// Optional error message if action failed
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_json_shapes() {
        let props: PropertyMap = serde_json::from_str(
            r#"{
                "color": "red",
                "background-color": {"variableId": "var-1"},
                "border-color": {"r": 1.0, "g": 2.0, "b": 3.0, "type": "ColorVariable"}
            }"#,
        )
        .unwrap();

        assert_eq!(props["color"], PropertyValue::literal("red"));
        assert_eq!(props["background-color"], PropertyValue::variable("var-1"));
        assert!(matches!(props["border-color"], PropertyValue::Color(_)));
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let style = NamedStyle::new("s-1", "Card");
        let json = serde_json::to_string(&style).unwrap();
        assert_eq!(json, r#"{"id":"s-1","name":"Card"}"#);
    }
}
