//! Named reference bitmaps.

use std::collections::BTreeMap;

use image::GrayImage;

/// A named grayscale reference bitmap for one logical screen state.
///
/// Names are opaque identifiers tied to device screen states (for example
/// `"SDcardIcon"` or `"browser_head_nfc"`).  A template never changes after
/// it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    image: GrayImage,
}

impl Template {
    pub fn new(name: impl Into<String>, image: GrayImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Immutable mapping from screen-state name to [`Template`].
///
/// Keys compare as exact strings and iterate in lexicographic order, so a
/// library built from the same templates always iterates identically.  A
/// library is assembled once (from disk or from synthesised text) and only
/// read afterwards; there is no way to insert into an existing library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, Template>,
}

impl TemplateLibrary {
    /// An empty library.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template names in iteration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }
}

/// Later templates replace earlier ones with the same name.
impl FromIterator<Template> for TemplateLibrary {
    fn from_iter<I: IntoIterator<Item = Template>>(iter: I) -> Self {
        let templates = iter
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        Self { templates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn solid(w: u32, h: u32, level: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([level]))
    }

    #[test]
    fn test_library_iterates_in_name_order() {
        // Arrange
        let lib: TemplateLibrary = vec![
            Template::new("zeta", solid(2, 2, 0)),
            Template::new("alpha", solid(2, 2, 0)),
            Template::new("mid", solid(2, 2, 0)),
        ]
        .into_iter()
        .collect();

        // Act
        let names: Vec<&str> = lib.names().collect();

        // Assert
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_duplicate_name_keeps_last_template() {
        let lib: TemplateLibrary = vec![
            Template::new("icon", solid(2, 2, 0)),
            Template::new("icon", solid(3, 3, 0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(lib.len(), 1);
        assert_eq!(lib.get("icon").map(Template::width), Some(3));
    }

    #[test]
    fn test_lookup_is_exact_and_case_sensitive() {
        let lib: TemplateLibrary = std::iter::once(Template::new("Settings", solid(1, 1, 0))).collect();

        assert!(lib.contains("Settings"));
        assert!(!lib.contains("settings"));
        assert!(lib.get("Setting").is_none());
    }

    #[test]
    fn test_new_library_is_empty() {
        let lib = TemplateLibrary::new();
        assert!(lib.is_empty());
        assert_eq!(lib.iter().count(), 0);
    }
}
