//! Change class definitions and the session palette.

use crate::color_utils::parse_color;
use crate::constants::DEFAULT_CLASSES;

/// A change class with a tag and a display color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    /// Tag written into result records (e.g. "added building")
    pub tag: String,
    /// Color identifier as configured (name or hex)
    pub color_name: String,
    /// Resolved RGB color
    pub color: [u8; 3],
}

impl ClassDefinition {
    /// Create a class from a tag and a color identifier.
    pub fn new(tag: &str, color_name: &str) -> Result<Self, PaletteError> {
        let color = parse_color(color_name).ok_or_else(|| PaletteError::UnknownColor {
            tag: tag.to_string(),
            color: color_name.to_string(),
        })?;
        Ok(Self {
            tag: tag.to_string(),
            color_name: color_name.to_string(),
            color,
        })
    }
}

/// Errors raised while building a palette.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
    #[error("No change classes defined")]
    Empty,

    #[error("Duplicate class tag '{0}'")]
    DuplicateTag(String),

    #[error("Unknown color '{color}' for class '{tag}'")]
    UnknownColor { tag: String, color: String },
}

/// The set of change classes available during a session.
///
/// Supplied once at session start and never mutated by the editor.
/// Tags are unique; order is the configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPalette {
    classes: Vec<ClassDefinition>,
}

impl ClassPalette {
    /// Build a palette, rejecting empty input and duplicate tags.
    pub fn new(classes: Vec<ClassDefinition>) -> Result<Self, PaletteError> {
        if classes.is_empty() {
            return Err(PaletteError::Empty);
        }
        for (i, class) in classes.iter().enumerate() {
            if classes[..i].iter().any(|c| c.tag == class.tag) {
                return Err(PaletteError::DuplicateTag(class.tag.clone()));
            }
        }
        Ok(Self { classes })
    }

    /// Build a palette from (tag, color identifier) pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, PaletteError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let classes = pairs
            .into_iter()
            .map(|(tag, color)| ClassDefinition::new(tag, color))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(classes)
    }

    /// The tag active when a session starts.
    pub fn first_tag(&self) -> &str {
        // Never empty, enforced by the constructor.
        &self.classes[0].tag
    }

    pub fn get(&self, tag: &str) -> Option<&ClassDefinition> {
        self.classes.iter().find(|c| c.tag == tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Resolve a tag to its RGB color.
    pub fn color_of(&self, tag: &str) -> Option<[u8; 3]> {
        self.get(tag).map(|c| c.color)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDefinition> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// The built-in change classes.
pub fn default_classes() -> ClassPalette {
    let classes = DEFAULT_CLASSES
        .iter()
        .map(|(tag, color)| ClassDefinition {
            tag: (*tag).to_string(),
            color_name: (*color).to_string(),
            color: parse_color(color).unwrap_or([255, 255, 255]),
        })
        .collect();
    ClassPalette { classes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classes() {
        let palette = default_classes();
        assert_eq!(palette.len(), 3);
        assert_eq!(palette.first_tag(), "added building");
        assert_eq!(palette.color_of("removed building"), Some([255, 0, 0]));
        assert_eq!(palette.color_of("uncertain"), Some([255, 165, 0]));
    }

    #[test]
    fn test_duplicate_tags_rejected() {
        let err = ClassPalette::from_pairs([("a", "red"), ("b", "green"), ("a", "blue")]);
        assert_eq!(err, Err(PaletteError::DuplicateTag("a".to_string())));
    }

    #[test]
    fn test_empty_palette_rejected() {
        assert_eq!(ClassPalette::new(Vec::new()), Err(PaletteError::Empty));
    }

    #[test]
    fn test_unknown_color_rejected() {
        let err = ClassPalette::from_pairs([("a", "chartreuse-ish")]).unwrap_err();
        assert!(matches!(err, PaletteError::UnknownColor { .. }));
    }

    #[test]
    fn test_unknown_tag_has_no_color() {
        assert_eq!(default_classes().color_of("nope"), None);
    }
}
