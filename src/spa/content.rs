//! Render output of a screen
//!
//! Screens render into a small element tree rather than into a concrete
//! surface. The managers hand that tree to a [`RenderTarget`](super::RenderTarget),
//! which decides how it is actually shown.

use std::collections::BTreeMap;

/// Attribute that marks the element which should receive focus on mount
pub const AUTOFOCUS_ATTRIBUTE: &str = "autofocus";

/// A single node of rendered content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

/// What `Screen::render` produces
///
/// A fragment is a list of unattached sibling nodes. Managers wrap it in a
/// single `div` before mounting so every mounted screen owns exactly one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Element(Element),
    Fragment(Vec<Element>),
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn div() -> Self {
        Self::new("div")
    }

    pub fn h1(text: impl Into<String>) -> Self {
        Self::new("h1").text(text)
    }

    pub fn h2(text: impl Into<String>) -> Self {
        Self::new("h2").text(text)
    }

    pub fn p(text: impl Into<String>) -> Self {
        Self::new("p").text(text)
    }

    pub fn img(src: impl Into<String>) -> Self {
        Self::new("img").attribute("src", src)
    }

    /// Add one or more space separated classes
    pub fn classes(mut self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            self.add_class(class);
        }
        self
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn autofocus(self) -> Self {
        self.attribute(AUTOFOCUS_ATTRIBUTE, "")
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn content(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Depth-first search for the first element with the given class
    pub fn find_by_class(&self, class: &str) -> Option<&Element> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_class(class))
    }

    /// Path (child indices from this element) to the first autofocus-marked element
    pub fn autofocus_path(&self) -> Option<Vec<usize>> {
        if self.attributes.contains_key(AUTOFOCUS_ATTRIBUTE) {
            return Some(Vec::new());
        }

        for (index, child) in self.children.iter().enumerate() {
            if let Some(mut path) = child.autofocus_path() {
                path.insert(0, index);
                return Some(path);
            }
        }

        None
    }

    /// All text in document order, one entry per element carrying text
    pub fn text_content(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut Vec<String>) {
        if let Some(text) = &self.text {
            out.push(text.clone());
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

impl Content {
    /// Normalize into a single mountable element
    pub fn into_element(self) -> Element {
        match self {
            Content::Element(element) => element,
            Content::Fragment(nodes) => Element::div().content(nodes),
        }
    }
}

impl From<Element> for Content {
    fn from(element: Element) -> Self {
        Content::Element(element)
    }
}

impl From<Vec<Element>> for Content {
    fn from(nodes: Vec<Element>) -> Self {
        Content::Fragment(nodes)
    }
}

/// Turn an arbitrary namespace into a css-friendly class name
///
/// `"spaOverlay"` and `"spa overlay"` both become `"spa-overlay"`.
pub fn to_css_class(name: &str) -> String {
    let mut class = String::with_capacity(name.len() + 4);
    let mut prev_dash = true;

    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if !prev_dash {
                class.push('-');
            }
            class.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else if ch.is_ascii_alphanumeric() {
            class.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            class.push('-');
            prev_dash = true;
        }
    }

    while class.ends_with('-') {
        class.pop();
    }

    class
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_is_wrapped_in_div() {
        let content = Content::Fragment(vec![Element::h1("a"), Element::p("b")]);
        let element = content.into_element();

        assert_eq!(element.tag, "div");
        assert_eq!(element.children.len(), 2);
        assert_eq!(element.text_content(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_autofocus_path_finds_first_marked_element() {
        let element = Element::div()
            .child(Element::p("intro"))
            .child(
                Element::div()
                    .child(Element::new("input"))
                    .child(Element::new("button").autofocus()),
            )
            .child(Element::new("button").autofocus());

        assert_eq!(element.autofocus_path(), Some(vec![1, 1]));
        assert_eq!(Element::div().autofocus_path(), None);
    }

    #[test]
    fn test_classes_are_not_duplicated() {
        let element = Element::div().classes("a b  a").classes("b c");
        assert_eq!(element.classes, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_to_css_class() {
        assert_eq!(to_css_class("spa-overlay"), "spa-overlay");
        assert_eq!(to_css_class("spaOverlay"), "spa-overlay");
        assert_eq!(to_css_class("Spa Loading!"), "spa-loading");
        assert_eq!(to_css_class(""), "");
    }
}
