use crate::error::TurtleError;
use crate::turtle::{Leaf, Segment};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A unique identifier for a line primitive registered in a [`LineScene`].
pub type PrimitiveId = u32;

/// The boundary between the turtle and whatever draws its output.
///
/// The turtle calls [`emit`](Self::emit) once per successful run with the full
/// segment and leaf buffers, and keeps every returned handle until it is cleared,
/// at which point the handles are passed back to [`remove_all`](Self::remove_all).
pub trait GeometryEmitter {
    /// Opaque reference to one drawable registered with the scene.
    type Handle;

    /// Builds and registers drawables for `segments` (and `leaves`) in `style`.
    fn emit(&mut self, segments: &[Segment], leaves: &[Leaf], style: &LineStyle)
    -> Vec<Self::Handle>;

    /// Unregisters every drawable in `handles`.
    fn remove_all(&mut self, handles: Vec<Self::Handle>);
}

/// An sRGB line color, written as `#rrggbb` in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineColor(pub [u8; 3]);

impl LineColor {
    pub const GREY: Self = Self([0x66, 0x66, 0x66]);

    /// Channels scaled to `0.0..=1.0`.
    pub fn to_f32(self) -> [f32; 3] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

impl Default for LineColor {
    fn default() -> Self {
        Self::GREY
    }
}

impl FromStr for LineColor {
    type Err = TurtleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TurtleError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let mut rgb = [0u8; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(rgb))
    }
}

impl TryFrom<String> for LineColor {
    type Error = TurtleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LineColor> for String {
    fn from(color: LineColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for LineColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// Line style handed to the emitter on every run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub width: f32,
    pub color: LineColor,
}

/// Material of a line primitive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineMaterial {
    pub color: LineColor,

    /// Screen-space width in pixels.
    pub width: f32,

    /// Whether the width shrinks with distance. Plant skeletons use constant width.
    pub size_attenuation: bool,
}

impl From<&LineStyle> for LineMaterial {
    fn from(style: &LineStyle) -> Self {
        Self {
            color: style.color,
            width: style.width,
            size_attenuation: false,
        }
    }
}

/// A single drawable line, one per turtle segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinePrimitive {
    pub start: Vec3,
    pub end: Vec3,
    pub material: LineMaterial,
}

/// An engine-agnostic scene of line primitives.
///
/// This is the reference [`GeometryEmitter`]: game engines can ingest the
/// primitives directly, or serialize the scene and rebuild it elsewhere.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LineScene {
    /// All registered lines, indexed by their unique ID.
    pub primitives: HashMap<PrimitiveId, LinePrimitive>,

    /// Number of leaf batches handed to the scene. Leaves have no geometry yet.
    pub leaf_hook_calls: usize,

    next_id: PrimitiveId,
}

impl LineScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a line and returns its ID.
    ///
    /// IDs count up and wrap around, skipping any that are still registered.
    pub fn add(&mut self, primitive: LinePrimitive) -> PrimitiveId {
        let mut id = self.next_id;
        while self.primitives.contains_key(&id) {
            id = id.wrapping_add(1);
        }
        self.next_id = id.wrapping_add(1);
        self.primitives.insert(id, primitive);
        id
    }

    /// Unregisters a line, returning it if it was present.
    pub fn remove(&mut self, id: PrimitiveId) -> Option<LinePrimitive> {
        self.primitives.remove(&id)
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&LinePrimitive> {
        self.primitives.get(&id)
    }

    /// Number of registered lines.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl GeometryEmitter for LineScene {
    type Handle = PrimitiveId;

    fn emit(
        &mut self,
        segments: &[Segment],
        leaves: &[Leaf],
        style: &LineStyle,
    ) -> Vec<PrimitiveId> {
        let material = LineMaterial::from(style);
        let ids = segments
            .iter()
            .map(|segment| {
                self.add(LinePrimitive {
                    start: segment.start,
                    end: segment.end,
                    material,
                })
            })
            .collect();

        if !leaves.is_empty() {
            self.leaf_hook_calls += 1;
        }
        ids
    }

    fn remove_all(&mut self, handles: Vec<PrimitiveId>) {
        for id in handles {
            // Ids removed out-of-band are skipped.
            let _ = self.remove(id);
        }
    }
}
