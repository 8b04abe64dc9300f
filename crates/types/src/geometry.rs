use serde::{Deserialize, Serialize};

/// Rounds `number` up to the next multiple of `base`.
///
/// Values already on the grid are returned unchanged. A non-positive base
/// leaves the number untouched.
pub fn round_up(number: f32, base: f32) -> f32 {
    if base <= 0.0 || number % base == 0.0 {
        return number;
    }
    (number / base).ceil() * base
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }
}

/// Resolved box-model numbers for one element, in pixels.
///
/// These are produced by a metrics provider and never computed by the
/// pagination core itself. `outer_h` includes border and padding but not
/// margins. A `max_w`/`max_h` of zero means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoxMetrics {
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub border_top: f32,
    pub border_bottom: f32,
    pub border_left: f32,
    pub border_right: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,
    pub padding_right: f32,
    pub outer_w: f32,
    pub outer_h: f32,
    pub min_w: f32,
    pub min_h: f32,
    pub max_w: f32,
    pub max_h: f32,
    pub line_height: f32,
}

impl BoxMetrics {
    /// Metrics for a plain box of the given outer height with no margins,
    /// borders or padding.
    pub fn with_height(outer_h: f32, line_height: f32) -> Self {
        Self {
            outer_h,
            line_height,
            ..Default::default()
        }
    }

    pub fn bp_top(&self) -> f32 {
        self.border_top + self.padding_top
    }

    pub fn bp_bottom(&self) -> f32 {
        self.border_bottom + self.padding_bottom
    }

    pub fn bp_height(&self) -> f32 {
        self.bp_top() + self.bp_bottom()
    }

    pub fn bp_width(&self) -> f32 {
        self.border_left + self.padding_left + self.border_right + self.padding_right
    }

    pub fn margin_height(&self) -> f32 {
        self.margin_top + self.margin_bottom
    }

    pub fn margin_width(&self) -> f32 {
        self.margin_left + self.margin_right
    }

    /// Content-box height.
    pub fn height(&self) -> f32 {
        self.outer_h - self.bp_height()
    }

    /// Content-box width.
    pub fn width(&self) -> f32 {
        self.outer_w - self.bp_width()
    }

    /// Whether `size` lies within the min/max range of these metrics.
    pub fn in_size_range(&self, size: Size) -> bool {
        size.width >= self.min_w
            && size.height >= self.min_h
            && (self.max_w == 0.0 || size.width <= self.max_w)
            && (self.max_h == 0.0 || size.height <= self.max_h)
    }
}
