pub mod capability;
pub mod document;
pub mod geometry;
pub mod position;

pub use capability::{Capability, CapabilitySet, Requirements};
pub use document::{
    FigurePayload, GridItemSpec, GridSpec, PayloadContent, SourceElement, SourceFigure, SourceNode,
    TemplateValue,
};
pub use geometry::{BoxMetrics, Size, round_up};
pub use position::ContentPosition;
