//! Two-pass connected-component labeling.
//!
//! A pixel is foreground when its blue byte is non-zero. The first raster
//! pass gives every foreground pixel a provisional label taken from its
//! already-visited neighbors (or a fresh one) and records every pair of
//! labels found touching in an [`EquivalenceTable`]. After resolution each
//! provisional label maps to the smallest label of its set. The second pass
//! rewrites the label map with final component ids and accumulates area,
//! bounding box and coordinate sums.
//!
//! Label 0 is background. Components are numbered from 1 in the order of
//! their first pixel in raster order, and that is also their order in
//! [`Labeling::components`]. Ids mean nothing across separate calls.
//!
//! Both passes are sequential; only mask materialization touches the pool.

use serde::{Deserialize, Serialize};

use crate::buffer::{BLUE, CHANNELS, PixelBuffer, WHITE_PIXEL};
use crate::parallel;
use crate::types::{ImagingError, Point, Size};

/// Which already-visited neighbors join a pixel to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Edge neighbors only: up and left.
    Four,
    /// Edge and corner neighbors: up-left, up, up-right and left.
    #[default]
    Eight,
}

impl TryFrom<u8> for Connectivity {
    type Error = ImagingError;

    /// Accepts the neighbor counts `4` and `8`.
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            other => Err(ImagingError::InvalidParameter(format!(
                "connectivity must be 4 or 8, got {other}"
            ))),
        }
    }
}

/// Union-find over provisional labels.
///
/// `parent[l] == l` for roots. Index 0 is the background and never merged.
/// Unions always hang the larger root under the smaller, so a set's root is
/// its smallest label.
#[derive(Debug, Clone)]
pub struct EquivalenceTable {
    parent: Vec<u32>,
    merges: usize,
}

impl Default for EquivalenceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EquivalenceTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: vec![0],
            merges: 0,
        }
    }

    /// Allocate the next label as its own root.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::DegenerateInput`] when the label space is
    /// exhausted.
    pub fn make_label(&mut self) -> Result<u32, ImagingError> {
        let label = u32::try_from(self.parent.len())
            .map_err(|_| ImagingError::DegenerateInput("too many provisional labels".into()))?;
        self.parent.push(label);
        Ok(label)
    }

    /// Number of provisional labels handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of unions that joined two distinct sets.
    #[must_use]
    pub const fn merges(&self) -> usize {
        self.merges
    }

    /// Root of `label`, compressing the path behind it.
    pub fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut current = label;
        while self.parent[current as usize] != root {
            let next = self.parent[current as usize];
            self.parent[current as usize] = root;
            current = next;
        }
        root
    }

    /// Record that `a` and `b` belong to the same component.
    pub fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (small, large) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[large as usize] = small;
        self.merges += 1;
    }

    /// Point every label directly at its root, highest label first.
    pub fn resolve(&mut self) {
        for label in (1..self.parent.len()).rev() {
            #[allow(clippy::cast_possible_truncation)]
            self.find(label as u32);
        }
    }
}

/// One connected region of foreground pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Component id, from 1.
    pub id: u32,
    /// Top-left corner of the bounding box (inclusive).
    pub top_left: Point,
    /// Bottom-right corner of the bounding box (inclusive).
    pub bottom_right: Point,
    /// Bounding box extent, `bottom_right - top_left + 1`.
    pub size: Size,
    /// Pixel count.
    pub area: u64,
    /// Mean member coordinate, truncated.
    pub centroid: Point,
}

impl Component {
    /// Whether `point` lies inside the bounding box.
    #[must_use]
    pub const fn bbox_contains(&self, point: Point) -> bool {
        self.top_left.x <= point.x
            && point.x <= self.bottom_right.x
            && self.top_left.y <= point.y
            && point.y <= self.bottom_right.y
    }
}

/// Result of one labeling run: the final label map plus component records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeling {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    components: Vec<Component>,
}

impl Labeling {
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Components in id order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Consume the labeling, keeping only the components.
    #[must_use]
    pub fn into_components(self) -> Vec<Component> {
        self.components
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Row-major label map; 0 is background.
    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Label of pixel `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] for coordinates outside the mask.
    pub fn label_at(&self, x: i64, y: i64) -> Result<u32, ImagingError> {
        let inside = (0..i64::from(self.width)).contains(&x) && (0..i64::from(self.height)).contains(&y);
        if !inside {
            return Err(ImagingError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let i = y as usize * self.width as usize + x as usize;
        Ok(self.labels[i])
    }

    /// The component with `id`, if any.
    #[must_use]
    pub fn component(&self, id: u32) -> Option<&Component> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.components.get(index)
    }

    /// Total pixels covered by all components.
    #[must_use]
    pub fn foreground_area(&self) -> u64 {
        self.components.iter().map(|c| c.area).sum()
    }

    /// The largest component by area; ties go to the lower id.
    #[must_use]
    pub fn largest(&self) -> Option<&Component> {
        self.components
            .iter()
            .reduce(|best, c| if c.area > best.area { c } else { best })
    }

    /// Mask of component `id` alone: members white, everything else black.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::InvalidParameter`] if no component has `id`.
    pub fn component_mask(&self, id: u32) -> Result<PixelBuffer, ImagingError> {
        if self.component(id).is_none() {
            return Err(ImagingError::InvalidParameter(format!(
                "no component with id {id} (have {})",
                self.components.len()
            )));
        }
        let width = self.width as usize;
        Ok(parallel::fill_rows(self.width, self.height, |y, row| {
            let start = y as usize * width;
            let labels = &self.labels[start..start + width];
            for (px, &label) in row.chunks_exact_mut(CHANNELS).zip(labels) {
                if label == id {
                    px.copy_from_slice(&WHITE_PIXEL);
                }
            }
        }))
    }

    /// Isolated masks of every component, in id order.
    pub fn masks(&self) -> impl Iterator<Item = PixelBuffer> + '_ {
        self.components
            .iter()
            .filter_map(|c| self.component_mask(c.id).ok())
    }
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    area: u64,
    sum_x: u64,
    sum_y: u64,
}

impl Accumulator {
    const fn new(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            area: 0,
            sum_x: 0,
            sum_y: 0,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.area += 1;
        self.sum_x += u64::from(x);
        self.sum_y += u64::from(y);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn finish(self, id: u32) -> Component {
        let point = |x: u64, y: u64| Point::new(x as i32, y as i32);
        Component {
            id,
            top_left: point(u64::from(self.min_x), u64::from(self.min_y)),
            bottom_right: point(u64::from(self.max_x), u64::from(self.max_y)),
            size: Size::new(self.max_x - self.min_x + 1, self.max_y - self.min_y + 1),
            area: self.area,
            centroid: point(self.sum_x / self.area, self.sum_y / self.area),
        }
    }
}

/// Label the connected foreground regions of `mask`.
///
/// # Errors
///
/// Returns [`ImagingError::DegenerateInput`] if the mask has no pixels.
pub fn label_components(
    mask: &PixelBuffer,
    connectivity: Connectivity,
) -> Result<Labeling, ImagingError> {
    if mask.is_empty() {
        return Err(ImagingError::DegenerateInput(format!(
            "cannot label a {} mask",
            mask.size()
        )));
    }
    let (width, height) = (mask.width(), mask.height());
    let w = width as usize;
    let bytes = mask.as_bytes();
    let is_foreground = |i: usize| bytes[i * CHANNELS + BLUE] != 0;

    // First pass: provisional labels and equivalences.
    let mut labels = vec![0u32; w * height as usize];
    let mut table = EquivalenceTable::new();
    let mut neighbors = [0u32; 4];
    for y in 0..height as usize {
        for x in 0..w {
            let i = y * w + x;
            if !is_foreground(i) {
                continue;
            }
            let mut n = 0;
            let mut push = |label: u32| {
                if label != 0 {
                    neighbors[n] = label;
                    n += 1;
                }
            };
            if x > 0 {
                push(labels[i - 1]);
            }
            if y > 0 {
                let up = i - w;
                push(labels[up]);
                if connectivity == Connectivity::Eight {
                    if x > 0 {
                        push(labels[up - 1]);
                    }
                    if x + 1 < w {
                        push(labels[up + 1]);
                    }
                }
            }
            let found = &neighbors[..n];
            labels[i] = match found.iter().min() {
                None => table.make_label()?,
                Some(&smallest) => {
                    for &other in found {
                        if other != smallest {
                            table.union(smallest, other);
                        }
                    }
                    smallest
                }
            };
        }
    }
    table.resolve();

    // Second pass: final ids in first-appearance order, plus statistics.
    let mut id_of_root = vec![0u32; table.len() + 1];
    let mut stats: Vec<Accumulator> = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let i = y as usize * w + x as usize;
            let provisional = labels[i];
            if provisional == 0 {
                continue;
            }
            let root = table.find(provisional) as usize;
            if id_of_root[root] == 0 {
                stats.push(Accumulator::new(x, y));
                // At most one component per provisional label, which fit in u32.
                id_of_root[root] = u32::try_from(stats.len()).unwrap_or(u32::MAX);
            }
            let id = id_of_root[root];
            labels[i] = id;
            stats[id as usize - 1].add(x, y);
        }
    }

    let components: Vec<Component> = stats
        .into_iter()
        .zip(1u32..)
        .map(|(acc, id)| acc.finish(id))
        .collect();

    log::debug!(
        "labeled {}x{} mask: {} provisional labels, {} merges, {} components",
        width,
        height,
        table.len(),
        table.merges(),
        components.len()
    );

    Ok(Labeling {
        width,
        height,
        labels,
        components,
    })
}
