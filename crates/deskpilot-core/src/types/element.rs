//! Located UI element types

use serde::{Deserialize, Serialize};

/// A bounding box in screen pixel space, serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox(pub i64, pub i64, pub i64, pub i64);

impl BoundingBox {
    /// Center point of the box, integer division.
    ///
    /// Computed on demand; never stored alongside the box.
    pub fn center(&self) -> (i64, i64) {
        ((self.0 + self.2) / 2, (self.1 + self.3) / 2)
    }
}

/// Either a single bounding box or a list of candidate boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    Single(BoundingBox),
    Many(Vec<BoundingBox>),
}

impl Coordinates {
    /// The primary box: the single box, or the first candidate.
    pub fn primary(&self) -> Option<&BoundingBox> {
        match self {
            Coordinates::Single(bbox) => Some(bbox),
            Coordinates::Many(boxes) => boxes.first(),
        }
    }
}

/// Output of a locate step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementLocation {
    /// Free-form element tag, e.g. "ui_element"
    pub element_type: String,
    /// Bounding box(es) for the element
    pub coordinates: Coordinates,
    /// Opaque diagnostic text from the vision model
    pub raw_response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_center_uses_integer_division() {
        assert_eq!(BoundingBox(0, 0, 101, 51).center(), (50, 25));
        assert_eq!(BoundingBox(10, 10, 20, 20).center(), (15, 15));
    }

    #[test]
    fn test_coordinates_accept_single_and_many() {
        let single: Coordinates = serde_json::from_value(json!([1, 2, 3, 4])).unwrap();
        assert_eq!(single.primary(), Some(&BoundingBox(1, 2, 3, 4)));

        let many: Coordinates =
            serde_json::from_value(json!([[1, 2, 3, 4], [5, 6, 7, 8]])).unwrap();
        assert_eq!(many.primary(), Some(&BoundingBox(1, 2, 3, 4)));

        let empty: Coordinates = serde_json::from_value(json!([])).unwrap();
        assert_eq!(empty.primary(), None);
    }
}
