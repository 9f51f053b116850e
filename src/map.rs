use std::borrow::Borrow;

use crate::color::Color;
use crate::types::{Issue, IssueId, IssueStatus, Priority};

/// Map center used when no issue carries coordinates (Pune).
pub const DEFAULT_CENTER: (f64, f64) = (18.5204, 73.8567);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("map area too small ({width}x{height})")]
    TooSmall { width: u16, height: u16 },
    #[error("map unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Status / priority mappings
// ---------------------------------------------------------------------------

/// Marker color per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPalette {
    pub pending: Color,
    pub assigned: Color,
    pub in_progress: Color,
    pub work_completed: Color,
    pub verified: Color,
    pub rejected: Color,
}

const fn hex(r: u8, g: u8, b: u8) -> Color {
    Color::Hex { r, g, b }
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self {
            pending: hex(0xca, 0x8a, 0x04),
            assigned: hex(0x93, 0x33, 0xea),
            in_progress: hex(0x25, 0x63, 0xeb),
            work_completed: hex(0x0d, 0x94, 0x88),
            verified: hex(0x16, 0xa3, 0x4a),
            rejected: hex(0xdc, 0x26, 0x26),
        }
    }
}

impl StatusPalette {
    pub fn color(&self, status: IssueStatus) -> Color {
        match status {
            IssueStatus::Pending => self.pending,
            IssueStatus::Assigned => self.assigned,
            IssueStatus::InProgress => self.in_progress,
            IssueStatus::WorkCompleted => self.work_completed,
            IssueStatus::Verified => self.verified,
            IssueStatus::Rejected => self.rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MarkerSize {
    Small,
    Medium,
    Large,
}

impl MarkerSize {
    pub fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::High => Self::Large,
            Priority::Medium => Self::Medium,
            Priority::Low => Self::Small,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Self::Large => '●',
            Self::Medium => '•',
            Self::Small => '·',
        }
    }
}

/// Heatmap intensity contributed by one issue.
pub fn heat_weight(priority: Priority) -> f64 {
    match priority {
        Priority::High => 1.0,
        Priority::Medium => 0.6,
        Priority::Low => 0.3,
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub id: IssueId,
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    pub status: IssueStatus,
    pub color: Color,
    pub size: MarkerSize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

/// Everything a visualizer needs to draw: one marker and one heat point per
/// located issue, in the order the issues were given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapScene {
    pub markers: Vec<MapMarker>,
    pub heat: Vec<HeatPoint>,
    /// Issues left off the map for lack of coordinates.
    pub unlocated: usize,
}

impl MapScene {
    pub fn from_issues<I: Borrow<Issue>>(issues: &[I], palette: &StatusPalette) -> Self {
        let mut scene = Self::default();
        for issue in issues {
            let issue = <I as Borrow<Issue>>::borrow(issue);
            let Some(loc) = &issue.location else {
                scene.unlocated += 1;
                continue;
            };
            scene.markers.push(MapMarker {
                id: issue.id.clone(),
                lat: loc.lat,
                lng: loc.lng,
                title: issue.title.clone(),
                status: issue.status,
                color: palette.color(issue.status),
                size: MarkerSize::for_priority(issue.priority),
            });
            scene.heat.push(HeatPoint {
                lat: loc.lat,
                lng: loc.lng,
                weight: heat_weight(issue.priority),
            });
        }
        scene
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// One draw request.
pub struct MapFrame<'a> {
    pub scene: &'a MapScene,
    pub heatmap: bool,
    pub selected: Option<usize>,
}

/// The rendering collaborator behind the map view. Implementations own
/// whatever resources drawing needs and release them in `teardown`.
pub trait Visualizer: Send {
    fn render(&mut self, frame: &MapFrame<'_>) -> Result<(), MapError>;
    fn teardown(&mut self);
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

type ActivateFn = Box<dyn FnMut(&IssueId) + Send + Sync>;

/// A mounted map: owns its visualizer for as long as the view that created
/// it is alive, and tears it down on drop.
pub struct MapSession<V: Visualizer> {
    visualizer: V,
    scene: MapScene,
    heatmap: bool,
    selected: Option<usize>,
    on_activate: Option<ActivateFn>,
    last_error: Option<MapError>,
}

impl<V: Visualizer> MapSession<V> {
    pub fn mount(visualizer: V) -> Self {
        tracing::debug!("map: mounting visualizer");
        Self {
            visualizer,
            scene: MapScene::default(),
            heatmap: false,
            selected: None,
            on_activate: None,
            last_error: None,
        }
    }

    /// Register the callback invoked with the issue id of an activated marker.
    pub fn on_activate<F>(mut self, f: F) -> Self
    where
        F: FnMut(&IssueId) + Send + Sync + 'static,
    {
        self.on_activate = Some(Box::new(f));
        self
    }

    /// Replace the scene and redraw. The selection follows its issue id when
    /// that issue is still on the map.
    pub fn update(&mut self, scene: MapScene) -> Result<(), MapError> {
        let selected_id = self.selected_marker().map(|m| m.id.clone());
        self.scene = scene;
        self.selected = match selected_id {
            Some(id) => self.scene.markers.iter().position(|m| m.id == id),
            None => None,
        }
        .or_else(|| (!self.scene.is_empty()).then_some(0));
        self.redraw()
    }

    pub fn set_heatmap(&mut self, enabled: bool) -> Result<(), MapError> {
        self.heatmap = enabled;
        self.redraw()
    }

    pub fn heatmap(&self) -> bool {
        self.heatmap
    }

    pub fn select_next(&mut self) -> Result<(), MapError> {
        let n = self.scene.markers.len();
        if n > 0 {
            self.selected = Some(self.selected.map_or(0, |i| (i + 1) % n));
        }
        self.redraw()
    }

    pub fn select_prev(&mut self) -> Result<(), MapError> {
        let n = self.scene.markers.len();
        if n > 0 {
            self.selected = Some(self.selected.map_or(0, |i| (i + n - 1) % n));
        }
        self.redraw()
    }

    pub fn selected_marker(&self) -> Option<&MapMarker> {
        self.selected.and_then(|i| self.scene.markers.get(i))
    }

    /// Activate the selected marker: invokes the callback and returns the id.
    pub fn activate(&mut self) -> Option<IssueId> {
        let id = self.selected_marker()?.id.clone();
        if let Some(cb) = self.on_activate.as_mut() {
            cb(&id);
        }
        Some(id)
    }

    pub fn scene(&self) -> &MapScene {
        &self.scene
    }

    pub fn visualizer(&self) -> &V {
        &self.visualizer
    }

    pub fn last_error(&self) -> Option<&MapError> {
        self.last_error.as_ref()
    }

    fn redraw(&mut self) -> Result<(), MapError> {
        let frame = MapFrame {
            scene: &self.scene,
            heatmap: self.heatmap,
            selected: self.selected,
        };
        let result = self.visualizer.render(&frame);
        if let Err(e) = &result {
            tracing::warn!("map: render failed: {e}");
        }
        self.last_error = result.as_ref().err().cloned();
        result
    }
}

impl<V: Visualizer> Drop for MapSession<V> {
    fn drop(&mut self) {
        tracing::debug!("map: tearing down visualizer");
        self.visualizer.teardown();
    }
}

// ---------------------------------------------------------------------------
// Character-grid visualizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub ch: char,
    pub color: Option<Color>,
    pub selected: bool,
}

impl GridCell {
    const BLANK: Self = Self {
        ch: ' ',
        color: None,
        selected: false,
    };
}

const HEAT_SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
const HEAT_RADIUS: i32 = 2;

/// Draws markers and heat onto a fixed-size character grid, north up.
#[derive(Debug, Clone)]
pub struct GridVisualizer {
    width: u16,
    height: u16,
    rows: Vec<Vec<GridCell>>,
    torn_down: bool,
}

impl GridVisualizer {
    pub const MIN_WIDTH: u16 = 10;
    pub const MIN_HEIGHT: u16 = 4;

    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            rows: Vec::new(),
            torn_down: false,
        }
    }

    pub fn rows(&self) -> &[Vec<GridCell>] {
        &self.rows
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Plain-text rendering of the last frame, one line per row.
    pub fn to_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.ch).collect::<String>().trim_end().to_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct Projection {
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
    width: i32,
    height: i32,
}

impl Projection {
    fn fit(scene: &MapScene, width: u16, height: u16) -> Self {
        let (mut min_lat, mut max_lat, mut min_lng, mut max_lng) = scene.markers.iter().fold(
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
            |(a, b, c, d), m| (a.min(m.lat), b.max(m.lat), c.min(m.lng), d.max(m.lng)),
        );
        if scene.markers.is_empty() {
            (min_lat, max_lat) = (DEFAULT_CENTER.0, DEFAULT_CENTER.0);
            (min_lng, max_lng) = (DEFAULT_CENTER.1, DEFAULT_CENTER.1);
        }
        let pad_lat = ((max_lat - min_lat) * 0.05).max(0.005);
        let pad_lng = ((max_lng - min_lng) * 0.05).max(0.005);
        Self {
            min_lat: min_lat - pad_lat,
            max_lat: max_lat + pad_lat,
            min_lng: min_lng - pad_lng,
            max_lng: max_lng + pad_lng,
            width: i32::from(width),
            height: i32::from(height),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell(&self, lat: f64, lng: f64) -> (i32, i32) {
        let fx = (lng - self.min_lng) / (self.max_lng - self.min_lng);
        let fy = (self.max_lat - lat) / (self.max_lat - self.min_lat);
        let x = (fx * f64::from(self.width - 1)).round() as i32;
        let y = (fy * f64::from(self.height - 1)).round() as i32;
        (x.clamp(0, self.width - 1), y.clamp(0, self.height - 1))
    }
}

impl Visualizer for GridVisualizer {
    fn render(&mut self, frame: &MapFrame<'_>) -> Result<(), MapError> {
        if self.torn_down {
            return Err(MapError::Unavailable("visualizer already torn down".to_owned()));
        }
        if self.width < Self::MIN_WIDTH || self.height < Self::MIN_HEIGHT {
            return Err(MapError::TooSmall {
                width: self.width,
                height: self.height,
            });
        }

        let w = usize::from(self.width);
        let h = usize::from(self.height);
        self.rows = vec![vec![GridCell::BLANK; w]; h];
        let proj = Projection::fit(frame.scene, self.width, self.height);

        if frame.heatmap {
            let mut heat = vec![vec![0.0_f64; w]; h];
            for p in &frame.scene.heat {
                let (cx, cy) = proj.cell(p.lat, p.lng);
                for dy in -HEAT_RADIUS..=HEAT_RADIUS {
                    for dx in -HEAT_RADIUS..=HEAT_RADIUS {
                        let (x, y) = (cx + dx, cy + dy);
                        if x < 0 || y < 0 || x >= proj.width || y >= proj.height {
                            continue;
                        }
                        let d2 = f64::from(dx * dx + dy * dy);
                        heat[y as usize][x as usize] += p.weight / (1.0 + d2);
                    }
                }
            }
            let max = heat.iter().flatten().copied().fold(0.0_f64, f64::max);
            if max > 0.0 {
                for (y, row) in heat.iter().enumerate() {
                    for (x, v) in row.iter().enumerate() {
                        let level = heat_level(*v / max);
                        if level > 0 {
                            self.rows[y][x] = GridCell {
                                ch: HEAT_SHADES[level],
                                color: Some(heat_color(*v / max)),
                                selected: false,
                            };
                        }
                    }
                }
            }
        }

        // Draw larger markers last so they win shared cells.
        let mut order: Vec<usize> = (0..frame.scene.markers.len()).collect();
        order.sort_by_key(|&i| frame.scene.markers[i].size);
        for i in order {
            let m = &frame.scene.markers[i];
            let (x, y) = proj.cell(m.lat, m.lng);
            self.rows[y as usize][x as usize] = GridCell {
                ch: m.size.glyph(),
                color: Some(m.color),
                selected: false,
            };
        }
        if let Some(m) = frame.selected.and_then(|i| frame.scene.markers.get(i)) {
            let (x, y) = proj.cell(m.lat, m.lng);
            self.rows[y as usize][x as usize] = GridCell {
                ch: '◉',
                color: Some(m.color),
                selected: true,
            };
        }
        Ok(())
    }

    fn teardown(&mut self) {
        self.rows.clear();
        self.torn_down = true;
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn heat_level(intensity: f64) -> usize {
    let steps = (HEAT_SHADES.len() - 1) as f64;
    ((intensity * steps).ceil() as usize).min(HEAT_SHADES.len() - 1)
}

fn heat_color(intensity: f64) -> Color {
    if intensity > 0.66 {
        hex(0xdc, 0x26, 0x26)
    } else if intensity > 0.33 {
        hex(0xea, 0x58, 0x0c)
    } else {
        hex(0xca, 0x8a, 0x04)
    }
}
