//! Builds the flattened block arena from a source element tree.

use super::Content;
use super::block::{Block, BlockMarkup, compute_first_line, has_block_children, is_replaced};
use super::figure::{FALLBACK_SIZE, Figure, FigureSize};
use crate::{LayoutError, PaginationConfig};
use folio_traits::MetricsProvider;
use folio_types::{
    BoxMetrics, PayloadContent, SourceElement, SourceFigure, SourceNode, TemplateValue, round_up,
};
use handlebars::Handlebars;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;

/// Template key used when a value record names no template.
const DEFAULT_TEMPLATE: &str = "_default";

/// Anything that child blocks and figures can be attached to: a block, or
/// the top level of the article.
pub(crate) trait BlockOwner {
    fn is_block_like(&self) -> bool;
    fn owner_index(&self) -> Option<u32>;
    fn push_block(&mut self, index: u32);
    fn push_figure(&mut self, index: u32);
    fn mark_contains_fallback(&mut self);
}

struct BlockScope {
    index: u32,
    children: Vec<u32>,
    figures: Vec<u32>,
    contains_fallback: bool,
}

impl BlockScope {
    fn new(index: u32) -> Self {
        Self {
            index,
            children: Vec::new(),
            figures: Vec::new(),
            contains_fallback: false,
        }
    }
}

impl BlockOwner for BlockScope {
    fn is_block_like(&self) -> bool {
        true
    }

    fn owner_index(&self) -> Option<u32> {
        Some(self.index)
    }

    fn push_block(&mut self, index: u32) {
        self.children.push(index);
    }

    fn push_figure(&mut self, index: u32) {
        self.figures.push(index);
    }

    fn mark_contains_fallback(&mut self) {
        self.contains_fallback = true;
    }
}

#[derive(Default)]
struct RootScope {
    children: Vec<u32>,
    figures: Vec<u32>,
}

impl BlockOwner for RootScope {
    fn is_block_like(&self) -> bool {
        false
    }

    fn owner_index(&self) -> Option<u32> {
        None
    }

    fn push_block(&mut self, index: u32) {
        self.children.push(index);
    }

    fn push_figure(&mut self, index: u32) {
        self.figures.push(index);
    }

    fn mark_contains_fallback(&mut self) {}
}

pub(crate) struct ContentBuilder<'a> {
    metrics: &'a dyn MetricsProvider,
    config: &'a PaginationConfig,
    templates: Handlebars<'static>,
    base_line_height: f32,
    slots: Vec<Option<Block>>,
    figures: Vec<Figure>,
}

impl<'a> ContentBuilder<'a> {
    pub(crate) fn new(metrics: &'a dyn MetricsProvider, config: &'a PaginationConfig) -> Self {
        let mut templates = Handlebars::new();
        templates.register_escape_fn(handlebars::no_escape);
        Self {
            metrics,
            config,
            templates,
            base_line_height: 1.0,
            slots: Vec::new(),
            figures: Vec::new(),
        }
    }

    pub(crate) fn build(mut self, root: &SourceElement) -> Result<Content, LayoutError> {
        let root_metrics = self.metrics.measure(root)?;
        if root_metrics.line_height > 0.0 {
            self.base_line_height = root_metrics.line_height;
        }

        let mut scope = RootScope::default();
        self.process_children(&mut scope, root, false);
        debug!(
            "Built content: {} top-level blocks, {} figures using {}",
            scope.children.len(),
            self.figures.len(),
            self.metrics.name()
        );

        let blocks = self
            .slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| LayoutError::Generic("block slot left unfilled".to_string()))?;
        if blocks.is_empty() && self.figures.is_empty() {
            return Err(LayoutError::EmptyContent);
        }

        let mut fields = BTreeMap::new();
        collect_fields(root, &mut fields);

        Ok(Content {
            blocks,
            figures: self.figures,
            line_height: self.base_line_height,
            col_width: root_metrics.outer_w,
            fields,
            capabilities: self.config.capabilities,
        })
    }

    fn slot(&self, index: u32) -> Option<&Block> {
        self.slots.get(index as usize)?.as_ref()
    }

    fn slot_mut(&mut self, index: u32) -> Option<&mut Block> {
        self.slots.get_mut(index as usize)?.as_mut()
    }

    fn reserve(&mut self) -> u32 {
        self.slots.push(None);
        (self.slots.len() - 1) as u32
    }

    fn process_children<O: BlockOwner>(
        &mut self,
        owner: &mut O,
        node: &SourceElement,
        within_fallback: bool,
    ) {
        let is_list = node.tag_name() == "ol";
        let mut list_index: i64 = node
            .attribute("start")
            .and_then(|s| s.trim().parse().ok())
            .filter(|v| *v != -1)
            .unwrap_or(1);
        let mut prev: Option<u32> = None;

        for child in &node.children {
            let placed = match child {
                SourceNode::Text { content } => {
                    if !content.trim().is_empty() {
                        debug!("Text ignored in block container <{}>", node.tag_name());
                    }
                    None
                }
                SourceNode::Element(el) => {
                    let numbered;
                    let el = if is_list && el.tag_name() == "li" {
                        // Zero is not a valid explicit value
                        if let Some(v) = el
                            .attribute("value")
                            .and_then(|v| v.trim().parse::<i64>().ok())
                            .filter(|v| *v != 0 && *v != -1)
                        {
                            list_index = v;
                        }
                        numbered = el.clone().with_attribute("value", list_index.to_string());
                        list_index += 1;
                        &numbered
                    } else {
                        el
                    };
                    let placed = self.build_block(el, within_fallback);
                    if placed
                        .and_then(|i| self.slot(i))
                        .is_some_and(|b| b.contains_fallback)
                    {
                        owner.mark_contains_fallback();
                    }
                    placed
                }
                SourceNode::Figure(fig) => {
                    if within_fallback {
                        warn!("Child figure ignored inside fallback content");
                        continue;
                    }
                    let (figure_index, fallback) = self.build_figure(fig);
                    owner.push_figure(figure_index);
                    if fallback.is_some() && owner.is_block_like() {
                        owner.mark_contains_fallback();
                    }
                    fallback
                }
            };

            if let Some(index) = placed {
                owner.push_block(index);
                let parent = owner.owner_index();
                if let Some(block) = self.slot_mut(index) {
                    block.parent = parent;
                }
                if let Some(prev_block) = prev.and_then(|p| self.slot_mut(p)) {
                    prev_block.next_sibling = Some(index);
                }
                prev = Some(index);
            }
        }
    }

    fn build_block(&mut self, el: &SourceElement, within_fallback: bool) -> Option<u32> {
        let mut metrics = match self.metrics.measure(el) {
            Ok(m) => m,
            Err(e) => {
                warn!("Unmeasurable <{}> dropped: {}", el.tag_name(), e);
                return None;
            }
        };
        if metrics.outer_h <= 0.0 {
            warn!("Zero-height <{}> ignored", el.tag_name());
            return None;
        }

        let base = self.base_line_height;
        let replaced = is_replaced(el);
        let keeptogether_class = el.has_class("keeptogether");
        let mut styles = Vec::new();
        if self.config.normalize_metrics {
            let (normalized, applied) =
                normalize_metrics(metrics, base, replaced || keeptogether_class);
            metrics = normalized;
            styles = applied;
        }

        let index = self.reserve();
        let mut scope = BlockScope::new(index);
        if !replaced && !keeptogether_class && has_block_children(el) {
            self.process_children(&mut scope, el, within_fallback);
        }

        let breakable = !replaced;
        if metrics.line_height <= 0.0 {
            metrics.line_height = base;
        }
        // A block that is exactly one line tall cannot be split either
        let keeptogether = !breakable
            || keeptogether_class
            || metrics.bp_height() + metrics.line_height == metrics.outer_h;

        let first_child = scope.children.first().and_then(|&c| self.slot(c));
        let first_line =
            compute_first_line(&metrics, keeptogether, scope.contains_fallback, first_child);

        let mut tag = shallow_copy(el);
        for (property, px) in &styles {
            tag.push_style(property, *px);
        }
        if self.config.debug_annotations {
            tag.attributes.insert("data-index".into(), index.to_string());
            tag.attributes
                .insert("data-outerheight".into(), metrics.outer_h.to_string());
            tag.attributes
                .insert("data-margintop".into(), metrics.margin_top.to_string());
            tag.attributes
                .insert("data-marginbottom".into(), metrics.margin_bottom.to_string());
            tag.attributes
                .insert("data-firstline".into(), first_line.to_string());
        }
        let markup = if scope.children.is_empty() {
            tag.children = el.children.clone();
            BlockMarkup {
                html: tag.to_markup(),
                ..Default::default()
            }
        } else {
            self.container_markup(&tag, &metrics, &scope.children)
        };

        if !scope.figures.is_empty() {
            debug!("Block {} anchors figures {:?}", index, scope.figures);
        }

        let block = Block {
            index,
            metrics,
            first_line,
            breakable,
            keeptogether,
            keepwithnext: el.has_class("keepwithnext"),
            column_break: el.has_class("columnbreak"),
            is_fallback: false,
            within_fallback,
            contains_fallback: scope.contains_fallback,
            figure: None,
            parent: None,
            next_sibling: None,
            children: scope.children,
            figures: scope.figures,
            subtree_end: (self.slots.len() - 1) as u32,
            markup,
        };
        self.slots[index as usize] = Some(block);
        Some(index)
    }

    fn container_markup(
        &self,
        tag: &SourceElement,
        metrics: &BoxMetrics,
        children: &[u32],
    ) -> BlockMarkup {
        let open = tag.open_tag();
        let close = tag.close_tag();

        let mut zero = tag.clone();
        if metrics.margin_top != 0.0 {
            zero.push_style("margin-top", 0.0);
        }
        if metrics.border_top != 0.0 {
            zero.push_style("border-top-width", 0.0);
        }
        if metrics.padding_top != 0.0 {
            zero.push_style("padding-top", 0.0);
        }

        let mut html = open.clone();
        for child in children.iter().filter_map(|&c| self.slot(c)) {
            html.push_str(child.html());
        }
        html.push_str(&close);

        BlockMarkup {
            html,
            open_tag: Some(open),
            open_tag_zero: Some(zero.open_tag()),
            close_tag: Some(close),
        }
    }

    fn build_figure(&mut self, fig: &SourceFigure) -> (u32, Option<u32>) {
        let figure_index = self.figures.len() as u32;
        let caps = self.config.capabilities;
        let mut figure = Figure {
            figure_index,
            anchor_index: self.slots.len() as u32,
            sizes: BTreeMap::new(),
            optional: !fig.has_class("required"),
            zoomable: fig.has_class("zoomable"),
            scrollable: fig.has_class("scroll"),
            fallback: None,
        };

        let mut fallback_source: Option<&SourceElement> = None;
        for payload in &fig.payloads {
            let is_fallback =
                payload.sizes.is_empty() || payload.sizes.iter().any(|s| s == FALLBACK_SIZE);
            if is_fallback && fallback_source.is_none() && payload.requires.satisfied_by(&caps) {
                match &payload.content {
                    PayloadContent::Element(el) => fallback_source = Some(el),
                    PayloadContent::Markup(_) => {
                        warn!("Figure {}: markup fallback ignored", figure_index)
                    }
                }
            }

            let markup = match &payload.content {
                PayloadContent::Element(el) => el.to_markup(),
                PayloadContent::Markup(s) => s.trim().to_string(),
            };
            let size = FigureSize {
                markup,
                min_w: payload.min_width,
                min_h: payload.min_height,
                requirements: payload.requires,
            };
            for name in payload.sizes.iter().filter(|s| *s != FALLBACK_SIZE) {
                figure.add_size(name, size.clone());
            }
        }

        for value in &fig.values {
            self.expand_template_value(&mut figure, fig, value);
        }

        if let Some(el) = fallback_source {
            if let Some(index) = self.build_block(el, true) {
                if let Some(block) = self.slot_mut(index) {
                    block.is_fallback = true;
                    block.figure = Some(figure_index);
                }
                figure.fallback = Some(index);
            }
        }

        if figure.sizes.is_empty() && figure.fallback.is_none() {
            warn!("Figure {} has no usable payloads", figure_index);
        }
        let fallback = figure.fallback;
        self.figures.push(figure);
        (figure_index, fallback)
    }

    fn expand_template_value(&self, figure: &mut Figure, fig: &SourceFigure, value: &TemplateValue) {
        if value.sizes.is_empty() {
            error!("Figure {}: template value without sizes ignored", figure.figure_index);
            return;
        }
        let name = value.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
        let Some(template) = fig.templates.get(name) else {
            error!("Figure {}: unknown template '{}'", figure.figure_index, name);
            return;
        };
        let fields: BTreeMap<String, &serde_json::Value> = value
            .fields
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        match self.templates.render_template(template.trim(), &fields) {
            Ok(markup) => {
                let size = FigureSize {
                    markup,
                    min_w: value.min_width,
                    min_h: value.min_height,
                    requirements: Default::default(),
                };
                for size_name in value.sizes.iter().filter(|s| *s != FALLBACK_SIZE) {
                    figure.add_size(size_name, size.clone());
                }
            }
            Err(e) => error!("Figure {}: template '{}' failed: {}", figure.figure_index, name, e),
        }
    }
}

/// Copy of an element without children or measurement data.
fn shallow_copy(el: &SourceElement) -> SourceElement {
    SourceElement {
        tag: el.tag.clone(),
        id: None,
        classes: el.classes.clone(),
        attributes: el.attributes.clone(),
        children: Vec::new(),
        metrics: None,
        display: el.display,
    }
}

fn collect_fields(el: &SourceElement, fields: &mut BTreeMap<String, String>) {
    if let Some(name) = el.attribute("itemprop").map(|n| n.trim().to_lowercase()) {
        if name.is_empty() {
            error!("Data field without itemprop name in <{}>", el.tag_name());
        } else {
            let text = el.text_content().trim().to_string();
            info!("Field found -- {}: {}", name, text);
            fields.insert(name, text);
        }
    }
    for child in el.element_children() {
        collect_fields(child, fields);
    }
}

/// Snaps margins, border+padding and outer height onto the base line grid.
///
/// Returns the adjusted metrics and the inline style declarations that make
/// the rendered element match them.
pub(crate) fn normalize_metrics(
    mut m: BoxMetrics,
    base: f32,
    unbreakable: bool,
) -> (BoxMetrics, Vec<(&'static str, f32)>) {
    let mut styles = Vec::new();
    if base <= 0.0 {
        return (m, styles);
    }

    if m.margin_top % base != 0.0 {
        m.margin_top = round_up(m.margin_top, base);
        styles.push(("margin-top", m.margin_top));
    }
    if m.margin_bottom % base != 0.0 {
        m.margin_bottom = round_up(m.margin_bottom, base);
        styles.push(("margin-bottom", m.margin_bottom));
    }

    if unbreakable {
        // Contents are out of reach, pad the bottom so the box stays on grid
        let off = m.outer_h % base;
        if off != 0.0 {
            m.padding_bottom += base - off;
            m.outer_h += base - off;
            styles.push(("padding-bottom", m.padding_bottom));
        }
        return (m, styles);
    }

    if m.line_height <= 0.0 {
        m.line_height = base;
        styles.push(("line-height", base));
    } else if m.line_height % base != 0.0 {
        m.line_height = round_up(m.line_height, base);
        styles.push(("line-height", m.line_height));
    }

    if m.bp_top() % base != 0.0 {
        let padding = round_up(m.bp_top(), base) - m.border_top;
        m.outer_h += padding - m.padding_top;
        m.padding_top = padding;
        styles.push(("padding-top", padding));
    }
    if m.bp_bottom() % base != 0.0 {
        let padding = round_up(m.bp_bottom(), base) - m.border_bottom;
        m.outer_h += padding - m.padding_bottom;
        m.padding_bottom = padding;
        styles.push(("padding-bottom", padding));
    }

    let off = m.outer_h % base;
    if off != 0.0 {
        info!("Forcing padding due to mismatch: {} % {}", m.outer_h, base);
        m.padding_bottom += base - off;
        m.outer_h += base - off;
        styles.push(("padding-bottom", m.padding_bottom));
    }
    (m, styles)
}
