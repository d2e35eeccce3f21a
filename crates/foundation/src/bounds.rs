/// Axis-aligned bounding boxes
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Box with its top-left corner at `origin`.
    pub fn from_origin_size(origin: [f64; 2], size: [f64; 2]) -> Self {
        Aabb2::new(origin, [origin[0] + size[0], origin[1] + size[1]])
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// Inclusive on every edge, so pointers on the border still count.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    /// Express `p` relative to the top-left corner of the box.
    pub fn to_local(&self, p: [f64; 2]) -> [f64; 2] {
        [p[0] - self.min[0], p[1] - self.min[1]]
    }
}
