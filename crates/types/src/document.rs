//! Serializable source model: the content tree handed to the tree builder,
//! figure payload declarations, and page template declarations.

use crate::capability::Requirements;
use crate::geometry::BoxMetrics;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SourceNode {
    Element(SourceElement),
    Figure(SourceFigure),
    Text { content: String },
}

impl SourceNode {
    pub fn text(content: impl Into<String>) -> Self {
        SourceNode::Text {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Display {
    Block,
    Inline,
    InlineBlock,
    ListItem,
}

impl Display {
    pub fn is_inline(&self) -> bool {
        matches!(self, Display::Inline | Display::InlineBlock)
    }
}

/// A content element. Metrics may be supplied inline; otherwise the metrics
/// provider resolves them (typically by `id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceElement {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<SourceNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BoxMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Display>,
}

impl Default for SourceElement {
    fn default() -> Self {
        Self {
            tag: "div".to_string(),
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            metrics: None,
            display: None,
        }
    }
}

impl SourceElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_metrics(mut self, metrics: BoxMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(SourceNode::text(text));
        self
    }

    pub fn with_child(mut self, child: SourceElement) -> Self {
        self.children.push(SourceNode::Element(child));
        self
    }

    pub fn with_figure(mut self, figure: SourceFigure) -> Self {
        self.children.push(SourceNode::Figure(figure));
        self
    }

    pub fn tag_name(&self) -> String {
        self.tag.to_ascii_lowercase()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c.eq_ignore_ascii_case(class))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Appends a declaration to the inline `style` attribute.
    pub fn push_style(&mut self, property: &str, px: f32) {
        let decl = format!("{}:{}px", property, px);
        match self.attributes.get_mut("style") {
            Some(style) if !style.trim().is_empty() => {
                let trimmed = style.trim_end().trim_end_matches(';').to_string();
                *style = format!("{};{}", trimmed, decl);
            }
            _ => {
                self.attributes.insert("style".to_string(), decl);
            }
        }
    }

    pub fn element_children(&self) -> impl Iterator<Item = &SourceElement> {
        self.children.iter().filter_map(|c| match c {
            SourceNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag_name().as_str())
    }

    /// Serializes the opening tag. Ids are never emitted since the same
    /// element may be rendered more than once across column splits.
    pub fn open_tag(&self) -> String {
        let mut out = format!("<{}", self.tag_name());
        if !self.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape_attr(&self.classes.join(" "))));
        }
        for (name, value) in &self.attributes {
            if name == "id" || name == "class" {
                continue;
            }
            out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
        }
        out.push('>');
        out
    }

    pub fn close_tag(&self) -> String {
        if self.is_void() {
            String::new()
        } else {
            format!("</{}>", self.tag_name())
        }
    }

    /// Full markup for this element and its descendants. Figures are never
    /// serialized inline.
    pub fn to_markup(&self) -> String {
        let mut out = self.open_tag();
        if !self.is_void() {
            for child in &self.children {
                match child {
                    SourceNode::Element(e) => out.push_str(&e.to_markup()),
                    SourceNode::Text { content } => out.push_str(&escape_text(content)),
                    SourceNode::Figure(_) => {}
                }
            }
        }
        out.push_str(&self.close_tag());
        out
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(el: &SourceElement, out: &mut String) {
    for child in &el.children {
        match child {
            SourceNode::Text { content } => out.push_str(content),
            SourceNode::Element(e) => collect_text(e, out),
            SourceNode::Figure(_) => {}
        }
    }
}

pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Accepts either `"one two"` or `["one", "two"]`.
fn space_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Names {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Names::deserialize(deserializer)? {
        Names::Joined(s) => s.split_whitespace().map(str::to_string).collect(),
        Names::List(items) => items,
    })
}

/// A figure: a media or sidebar unit with several size-specific renderings.
///
/// A payload without sizes (or sized `fallback`) becomes the fallback block
/// shown in the text flow when no container accepts the figure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFigure {
    pub classes: Vec<String>,
    pub payloads: Vec<FigurePayload>,
    /// Named markup templates with `{{ field }}` placeholders. Unnamed
    /// templates use the key `_default`.
    pub templates: BTreeMap<String, String>,
    /// Value records expanded through `templates`.
    pub values: Vec<TemplateValue>,
}

impl SourceFigure {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c.eq_ignore_ascii_case(class))
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_payload(mut self, payload: FigurePayload) -> Self {
        self.payloads.push(payload);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FigurePayload {
    #[serde(deserialize_with = "space_separated")]
    pub sizes: Vec<String>,
    pub requires: Requirements,
    pub min_width: f32,
    pub min_height: f32,
    pub content: PayloadContent,
}

impl Default for FigurePayload {
    fn default() -> Self {
        Self {
            sizes: Vec::new(),
            requires: Requirements::none(),
            min_width: 0.0,
            min_height: 0.0,
            content: PayloadContent::Markup(String::new()),
        }
    }
}

impl FigurePayload {
    pub fn markup(sizes: &[&str], markup: impl Into<String>) -> Self {
        Self {
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
            content: PayloadContent::Markup(markup.into()),
            ..Default::default()
        }
    }

    pub fn element(sizes: &[&str], element: SourceElement) -> Self {
        Self {
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
            content: PayloadContent::Element(element),
            ..Default::default()
        }
    }

    pub fn with_min_height(mut self, min_height: f32) -> Self {
        self.min_height = min_height;
        self
    }

    pub fn with_requirements(mut self, requires: Requirements) -> Self {
        self.requires = requires;
        self
    }
}

/// Payloads are either an element tree, or pre-serialized ("cloaked") markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadContent {
    Element(SourceElement),
    Markup(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateValue {
    #[serde(deserialize_with = "space_separated")]
    pub sizes: Vec<String>,
    pub template: Option<String>,
    pub min_width: f32,
    pub min_height: f32,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// A page template declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridSpec {
    pub name: String,
    pub classes: Vec<String>,
    pub requires: Requirements,
    /// Box metrics of the grid element itself.
    pub size: BoxMetrics,
    pub bonus: f32,
    /// Extra page chrome with `{{ field }}` placeholders bound to content fields.
    pub template: Option<String>,
    /// Columns and containers in document order.
    pub items: Vec<GridItemSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GridItemSpec {
    Column {
        height: f32,
        width: f32,
        #[serde(default)]
        min_height: f32,
        #[serde(default)]
        fixed: bool,
    },
    Container {
        height: f32,
        #[serde(default)]
        min_height: f32,
        #[serde(default, deserialize_with = "space_separated")]
        sizes: Vec<String>,
        #[serde(default)]
        fixed: bool,
        #[serde(default)]
        bottom: bool,
    },
}
