use serde::{Deserialize, Serialize};

/// Pixel rectangle of the plot area, supplied by the surrounding layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }
    pub fn min_y(&self) -> f64 {
        self.y
    }
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width * 0.5
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height * 0.5
    }

    /// Length of the shorter side.
    pub fn min_extent(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }
}

/// Visible domain of the chart (data space).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisDomain {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for AxisDomain {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        }
    }
}

impl AxisDomain {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Everything the pipeline needs to know about the target plot: pixel bounds
/// and the data domain they display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotContext {
    pub bounds: PlotBounds,
    pub domain: AxisDomain,
}

impl PlotContext {
    pub fn new(bounds: PlotBounds, domain: AxisDomain) -> Self {
        Self { bounds, domain }
    }

    /// Data units covered by one pixel along X.
    pub fn units_per_pixel_x(&self) -> f64 {
        self.domain.width() / self.bounds.width
    }

    /// Data units covered by one pixel along Y.
    pub fn units_per_pixel_y(&self) -> f64 {
        self.domain.height() / self.bounds.height
    }
}
