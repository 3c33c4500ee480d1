//! Turtle state and operations for plant interpretation.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// The pose of the plant turtle.
///
/// `heading` and `up` are rotated together by every turn, so repeated turns may let
/// them drift away from orthogonal. Nothing re-orthogonalises them except the
/// explicit realign operation (`$`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    /// Current world-space position of the "cursor".
    pub position: Vec3,

    /// Direction of travel for forward moves.
    pub heading: Vec3,

    /// Roll reference; the axis for `+`/`-` turns.
    pub up: Vec3,
}

impl Default for TurtleState {
    /// Standing at the origin, growing along +Y with +Z as up.
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            heading: Vec3::Y,
            up: Vec3::Z,
        }
    }
}

impl TurtleState {
    /// Creates a pose from its parts, taken as given (no normalisation).
    pub fn new(position: Vec3, heading: Vec3, up: Vec3) -> Self {
        Self {
            position,
            heading,
            up,
        }
    }

    /// The lateral axis, `heading × up`. Not normalised.
    pub fn right(&self) -> Vec3 {
        self.heading.cross(self.up)
    }

    /// Rotates heading and up around the up axis by `angle` radians.
    ///
    /// Returns false (and leaves the pose untouched) if the axis is degenerate.
    pub fn rotate_about_up(&mut self, angle: f32) -> bool {
        self.rotate_about(self.up, angle)
    }

    /// Rotates heading and up around the heading axis by `angle` radians.
    pub fn rotate_about_heading(&mut self, angle: f32) -> bool {
        self.rotate_about(self.heading, angle)
    }

    /// Rotates heading and up around `heading × up` by `angle` radians.
    pub fn rotate_about_lateral(&mut self, angle: f32) -> bool {
        self.rotate_about(self.right(), angle)
    }

    /// Applies the same axis-angle rotation to both heading and up.
    fn rotate_about(&mut self, axis: Vec3, angle: f32) -> bool {
        let Some(axis) = axis.try_normalize() else {
            return false;
        };
        let rot = Quat::from_axis_angle(axis, angle);
        self.heading = rot * self.heading;
        self.up = rot * self.up;
        true
    }

    /// Recomputes up as `heading × (world_up × heading)`.
    ///
    /// The result is world up projected orthogonal to the heading, scaled by
    /// `|heading|² sin θ`. It is not normalised.
    pub fn realign_up(&mut self, world_up: Vec3) {
        self.up = self.heading.cross(world_up.cross(self.heading));
    }

    /// Moves the cursor `distance` along the heading and returns the previous position.
    pub fn advance(&mut self, distance: f32) -> Vec3 {
        let from = self.position;
        self.position += self.heading * distance;
        from
    }
}

/// A drawn piece of the skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Where the first forward move of the segment began.
    pub start: Vec3,
    /// Where the last merged forward move ended.
    pub end: Vec3,
}

impl Segment {
    /// Creates a segment from `start` to `end`.
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Euclidean distance between the endpoints.
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// A leaf marker: the full turtle pose at the moment `L` executed.
pub type Leaf = TurtleState;

/// Operations that can be performed by the plant turtle.
///
/// Rotation variants carry the sign (`1.0` or `-1.0`) applied to the configured angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurtleOp {
    // --- Drawing ---
    /// Move forward and draw (`F`).
    Forward,
    /// Drop a leaf marker (`L`).
    Leaf,

    // --- Orientation ---
    /// Rotate around the up axis (`+`/`-`).
    RotateUp(f32),
    /// Rotate around the heading axis (`/` / `\`).
    RotateHeading(f32),
    /// Rotate around the lateral axis (`&`/`^`).
    RotateLateral(f32),
    /// Re-derive up from world up (`$`).
    Realign,

    // --- Flow Control ---
    /// Save position, heading and up onto the stack (`[`).
    Push,
    /// Restore the most recently pushed pose (`]`).
    Pop,
    /// Skip to the end of the enclosing branch, then pop (`%`).
    Prune,
    /// No-op. Grammars may emit symbols with no turtle meaning.
    Ignore,
}

impl TurtleOp {
    /// The standard single-character opcode table.
    pub const STANDARD_SYMBOLS: [(char, TurtleOp); 12] = [
        ('F', TurtleOp::Forward),
        ('L', TurtleOp::Leaf),
        ('+', TurtleOp::RotateUp(1.0)),
        ('-', TurtleOp::RotateUp(-1.0)),
        ('/', TurtleOp::RotateHeading(1.0)),
        ('\\', TurtleOp::RotateHeading(-1.0)),
        ('&', TurtleOp::RotateLateral(1.0)),
        ('^', TurtleOp::RotateLateral(-1.0)),
        ('$', TurtleOp::Realign),
        ('[', TurtleOp::Push),
        (']', TurtleOp::Pop),
        ('%', TurtleOp::Prune),
    ];

    /// Maps a character to its operation. Unknown characters are [`TurtleOp::Ignore`].
    pub fn from_char(c: char) -> Self {
        Self::STANDARD_SYMBOLS
            .iter()
            .find(|(sym, _)| *sym == c)
            .map_or(Self::Ignore, |&(_, op)| op)
    }

    /// Tokenizes an instruction string, one op per character.
    pub fn parse_str(instructions: &str) -> Vec<TurtleOp> {
        instructions.chars().map(Self::from_char).collect()
    }
}
