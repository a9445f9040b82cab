/// Category labels — the destination subfolder for a class of extensions.
use compact_str::CompactString;
use std::fmt;

/// Label used for the sentinel category.
pub const OTHER_LABEL: &str = "Other";

/// A concrete category label or the "Other" sentinel.
///
/// The sentinel means "no relocation policy defined" and is never handed to
/// the relocator: only [`Category::Named`] labels can be turned into a
/// destination directory (see [`Category::label`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Named(CompactString),
    Other,
}

impl Category {
    /// Build a category from a configured label.
    ///
    /// Empty labels and labels equal to [`OTHER_LABEL`] (any case) collapse to
    /// the sentinel so configuration can never smuggle in a folder called
    /// "Other".
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(OTHER_LABEL) {
            Self::Other
        } else {
            Self::Named(CompactString::new(trimmed))
        }
    }

    /// The concrete label, or `None` for the sentinel.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Named(label) => Some(label.as_str()),
            Self::Other => None,
        }
    }

    pub fn is_other(&self) -> bool {
        matches!(self, Self::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(label) => f.write_str(label),
            Self::Other => f.write_str(OTHER_LABEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_label_collapses_to_sentinel() {
        assert_eq!(Category::from_label("Other"), Category::Other);
        assert_eq!(Category::from_label("  other "), Category::Other);
        assert_eq!(Category::from_label(""), Category::Other);
    }

    #[test]
    fn named_label_round_trips_through_display() {
        let cat = Category::from_label("Images");
        assert_eq!(cat.label(), Some("Images"));
        assert_eq!(cat.to_string(), "Images");
        assert!(!cat.is_other());
    }

    #[test]
    fn sentinel_has_no_label() {
        assert_eq!(Category::Other.label(), None);
        assert_eq!(Category::Other.to_string(), "Other");
    }
}
