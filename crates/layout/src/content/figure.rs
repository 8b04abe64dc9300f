use folio_types::{CapabilitySet, Requirements};
use std::collections::BTreeMap;

/// Size name marking a payload as the figure's in-flow fallback.
pub const FALLBACK_SIZE: &str = "fallback";

/// One rendering of a figure at a named size.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureSize {
    pub markup: String,
    pub min_w: f32,
    pub min_h: f32,
    pub requirements: Requirements,
}

impl FigureSize {
    pub fn meets_requirements(&self, caps: &CapabilitySet) -> bool {
        self.requirements.satisfied_by(caps)
    }

    /// Markup with deferred `data-src` sources activated.
    pub fn uncloaked_markup(&self) -> String {
        Self::uncloak(&self.markup)
    }

    pub fn uncloak(markup: &str) -> String {
        markup.replace(" data-src=", " src=")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub figure_index: u32,
    /// Block index at which the figure appears in the text flow.
    pub anchor_index: u32,
    /// Size variants per name, in declaration order.
    pub sizes: BTreeMap<String, Vec<FigureSize>>,
    pub optional: bool,
    pub zoomable: bool,
    pub scrollable: bool,
    /// Root block of the fallback subtree.
    pub fallback: Option<u32>,
}

impl Figure {
    /// The first variant declared for `name` that the capabilities allow.
    pub fn get_size(&self, name: &str, caps: &CapabilitySet) -> Option<&FigureSize> {
        self.sizes
            .get(name)?
            .iter()
            .find(|s| s.meets_requirements(caps))
    }

    pub fn has_size(&self, name: &str) -> bool {
        self.sizes.contains_key(name)
    }

    pub(crate) fn add_size(&mut self, name: &str, size: FigureSize) {
        self.sizes.entry(name.to_string()).or_default().push(size);
    }
}
