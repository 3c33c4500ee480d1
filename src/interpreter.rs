//! Interpreter that turns an L-System instruction stream into line segments and leaves.
//!
//! The entry point is [`Turtle`]. Configure it with a [`TurtleConfig`], a home pose and a
//! [`GeometryEmitter`], then call [`Turtle::run`] with a derived instruction string, or
//! bind Symbios symbol IDs via [`Turtle::populate_standard_symbols`] and call
//! [`Turtle::run_state`] with a [`symbios::SymbiosState`].

use crate::error::TurtleError;
use crate::scene::{GeometryEmitter, LineColor, LineStyle};
use crate::turtle::{Leaf, Segment, TurtleOp, TurtleState};
use glam::Vec3;
use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use symbios::{SymbiosState, SymbolTable};

/// Branch depth at the `%` that starts a prune scan.
const PRUNE_START_DEPTH: isize = 0;
/// Depth reached once the `]` closing the pruned branch has been consumed.
const PRUNE_STOP_DEPTH: isize = -1;

/// How angle randomness ranges are scaled before being added to a turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleJitter {
    /// The range is added to the radian angle as-is, so a range of `5` wobbles by up
    /// to 5 radians.
    #[default]
    Raw,
    /// The range is read as degrees and converted to radians first.
    Radians,
}

/// What happens when branch brackets do not balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnderflowPolicy {
    /// Fail the run with a [`TurtleError`] before anything is emitted.
    #[default]
    Strict,
    /// Log a warning and carry on: empty pops are no-ops, pushes past the depth
    /// limit are dropped, open branches at the end are left alone.
    Lenient,
}

/// Configuration for plant interpretation.
///
/// Angles are in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurtleConfig {
    /// Base length of a forward move.
    pub step_length: f32,
    /// Each forward move adds `uniform(-r, r)` to the step.
    pub length_randomness: f32,

    /// Bend for `&`/`^` (around `heading × up`).
    pub lateral_angle: f32,
    /// Bend for `/` and `\` (around the heading).
    pub yaw_angle: f32,
    /// Bend for `+`/`-` (around up).
    pub up_angle: f32,

    pub lateral_randomness: f32,
    pub yaw_randomness: f32,
    pub up_randomness: f32,
    pub angle_jitter: AngleJitter,

    pub line_width: f32,
    pub line_color: LineColor,

    /// Reference direction for the realign operation (`$`).
    pub world_up: Vec3,

    pub underflow: UnderflowPolicy,
    /// Maximum stack depth for push/pop operations.
    pub max_stack_depth: usize,

    /// Seeds the internal generator. `None` draws a seed from the OS.
    pub seed: Option<u64>,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            step_length: 1.0,
            length_randomness: 0.0,
            lateral_angle: 60.0,
            yaw_angle: 90.0,
            up_angle: 45.0,
            lateral_randomness: 0.0,
            yaw_randomness: 0.0,
            up_randomness: 0.0,
            angle_jitter: AngleJitter::Raw,
            line_width: 10.0,
            line_color: LineColor::GREY,
            world_up: Vec3::Y,
            underflow: UnderflowPolicy::Strict,
            max_stack_depth: 1024,
            seed: None,
        }
    }
}

impl TurtleConfig {
    /// Checks that every numeric field is usable.
    pub fn validate(&self) -> Result<(), TurtleError> {
        let finite = [
            ("step_length", self.step_length),
            ("lateral_angle", self.lateral_angle),
            ("yaw_angle", self.yaw_angle),
            ("up_angle", self.up_angle),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(TurtleError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }

        let ranges = [
            ("length_randomness", self.length_randomness),
            ("lateral_randomness", self.lateral_randomness),
            ("yaw_randomness", self.yaw_randomness),
            ("up_randomness", self.up_randomness),
        ];
        for (name, value) in ranges {
            if !value.is_finite() || value < 0.0 {
                return Err(TurtleError::InvalidConfig(format!(
                    "{name} must be a finite, non-negative range, got {value}"
                )));
            }
        }
        // Step jitter samples the full `-r..r` span.
        if !(2.0 * self.length_randomness).is_finite() {
            return Err(TurtleError::InvalidConfig(format!(
                "length_randomness span overflows, got {}",
                self.length_randomness
            )));
        }

        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(TurtleError::InvalidConfig(format!(
                "line_width must be positive, got {}",
                self.line_width
            )));
        }
        if !self.world_up.is_finite() || self.world_up.length_squared() == 0.0 {
            return Err(TurtleError::InvalidConfig(format!(
                "world_up must be a non-zero vector, got {}",
                self.world_up
            )));
        }
        if self.max_stack_depth == 0 {
            return Err(TurtleError::InvalidConfig(
                "max_stack_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The style handed to the emitter on every run.
    pub fn line_style(&self) -> LineStyle {
        LineStyle {
            width: self.line_width,
            color: self.line_color,
        }
    }
}

/// Draws from `low..high`, or returns `low` for an empty range without touching `rng`.
fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high <= low {
        return low;
    }
    rng.gen_range(low..high)
}

/// Returns the index just past the `Pop` that closes the branch containing `from - 1`,
/// or `ops.len()` when the branch is never closed.
fn branch_end(ops: &[TurtleOp], from: usize) -> usize {
    let mut depth = PRUNE_START_DEPTH;
    let mut idx = from;
    while idx < ops.len() && depth != PRUNE_STOP_DEPTH {
        match ops[idx] {
            TurtleOp::Push => depth += 1,
            TurtleOp::Pop => depth -= 1,
            _ => {}
        }
        idx += 1;
    }
    idx
}

/// Interprets L-System output into a plant skeleton.
///
/// The turtle owns its cursor, branch stack, segment and leaf buffers, and every
/// scene handle its emitter has returned. Nothing is shared between turtles.
pub struct Turtle<E: GeometryEmitter, R: Rng = Pcg32> {
    config: TurtleConfig,
    home: TurtleState,
    cursor: TurtleState,
    stack: Vec<TurtleState>,
    segments: Vec<Segment>,
    leaves: Vec<Leaf>,
    emitter: E,
    handles: Vec<E::Handle>,
    rng: R,
    age: i64,
    op_map: Vec<TurtleOp>,
}

impl<E: GeometryEmitter> Turtle<E, Pcg32> {
    /// Creates a turtle standing at `home`, drawing into `emitter`.
    ///
    /// The generator is seeded from `config.seed`, or from the OS when unset.
    pub fn new(config: TurtleConfig, home: TurtleState, emitter: E) -> Result<Self, TurtleError> {
        let rng = match config.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_entropy(),
        };
        Self::with_rng(config, home, emitter, rng)
    }
}

impl<E: GeometryEmitter, R: Rng> Turtle<E, R> {
    /// Creates a turtle that draws its randomness from `rng`.
    pub fn with_rng(
        config: TurtleConfig,
        home: TurtleState,
        emitter: E,
        rng: R,
    ) -> Result<Self, TurtleError> {
        config.validate()?;
        Ok(Self {
            config,
            home,
            cursor: home,
            stack: Vec::new(),
            segments: Vec::new(),
            leaves: Vec::new(),
            emitter,
            handles: Vec::new(),
            rng,
            age: -1,
            op_map: Vec::new(),
        })
    }

    // --- Symbol binding ---

    /// Replaces the entire symbol-to-operation map in one step (builder pattern).
    ///
    /// `map` is indexed by symbol ID as returned by [`symbios::SymbolTable`].
    /// Any ID that falls outside the slice is treated as [`TurtleOp::Ignore`].
    pub fn with_map(mut self, map: Vec<TurtleOp>) -> Self {
        self.op_map = map;
        self
    }

    /// Assigns a single [`TurtleOp`] to a symbol ID, growing the map as needed.
    pub fn set_op(&mut self, sym_id: u16, op: TurtleOp) {
        let idx = sym_id as usize;
        if idx >= self.op_map.len() {
            self.op_map.resize(idx + 1, TurtleOp::Ignore);
        }
        self.op_map[idx] = op;
    }

    /// Binds every symbol of [`TurtleOp::STANDARD_SYMBOLS`] found in `interner`.
    ///
    /// Symbols the grammar never interned are skipped.
    pub fn populate_standard_symbols(&mut self, interner: &SymbolTable) {
        let mut buf = [0u8; 4];
        for (sym, op) in TurtleOp::STANDARD_SYMBOLS {
            if let Some(id) = interner.resolve_id(sym.encode_utf8(&mut buf)) {
                self.set_op(id, op);
            }
        }
    }

    // --- Running ---

    /// Interprets an instruction string, one opcode per character, then emits.
    pub fn run(&mut self, instructions: &str) -> Result<(), TurtleError> {
        self.run_ops(&TurtleOp::parse_str(instructions))
    }

    /// Interprets a derived Symbios state through the bound symbol map, then emits.
    pub fn run_state(&mut self, state: &SymbiosState) -> Result<(), TurtleError> {
        let ops: Vec<TurtleOp> = (0..state.len())
            .map_while(|i| state.get_view(i))
            .map(|view| {
                self.op_map
                    .get(view.sym as usize)
                    .copied()
                    .unwrap_or(TurtleOp::Ignore)
            })
            .collect();
        self.run_ops(&ops)
    }

    /// Interprets `ops` left to right, then hands the full buffers to the emitter.
    ///
    /// The cursor carries on from wherever the previous run left it; the branch stack
    /// starts empty. Consecutive forward moves extend the last segment instead of
    /// starting a new one.
    ///
    /// # Errors
    ///
    /// Under [`UnderflowPolicy::Strict`] unbalanced brackets abort the run before
    /// emission. Segments and leaves produced up to that point stay buffered.
    pub fn run_ops(&mut self, ops: &[TurtleOp]) -> Result<(), TurtleError> {
        self.age += 1;
        self.config.validate()?;
        self.stack.clear();

        let mut extend_segment = false;
        let mut idx = 0;
        while idx < ops.len() {
            let at = idx;
            let op = ops[idx];
            idx += 1;

            match op {
                // --- DRAWING ---
                TurtleOp::Forward => {
                    let step = self.config.step_length + self.length_jitter();
                    let from = self.cursor.advance(step);
                    let to = self.cursor.position;
                    if extend_segment && let Some(last) = self.segments.last_mut() {
                        last.end = to;
                    } else {
                        self.segments.push(Segment::new(from, to));
                    }
                }
                TurtleOp::Leaf => self.leaves.push(self.cursor),

                // --- ORIENTATION ---
                TurtleOp::RotateUp(sign) => {
                    let angle = self.bend(self.config.up_angle, self.config.up_randomness, sign);
                    if !self.cursor.rotate_about_up(angle) {
                        warn!("Degenerate up axis at op {at}; turn skipped");
                    }
                }
                TurtleOp::RotateHeading(sign) => {
                    let angle =
                        self.bend(self.config.yaw_angle, self.config.yaw_randomness, sign);
                    if !self.cursor.rotate_about_heading(angle) {
                        warn!("Degenerate heading at op {at}; roll skipped");
                    }
                }
                TurtleOp::RotateLateral(sign) => {
                    let angle = self.bend(
                        self.config.lateral_angle,
                        self.config.lateral_randomness,
                        sign,
                    );
                    if !self.cursor.rotate_about_lateral(angle) {
                        warn!("Degenerate lateral axis at op {at}; pitch skipped");
                    }
                }
                TurtleOp::Realign => self.cursor.realign_up(self.config.world_up),

                // --- FLOW ---
                TurtleOp::Push => self.push_branch(at)?,
                TurtleOp::Pop => self.pop_branch(at)?,
                TurtleOp::Prune => {
                    idx = branch_end(ops, idx);
                    trace!("Pruned ops {}..{idx}", at + 1);
                    self.pop_branch(at)?;
                }
                TurtleOp::Ignore => {}
            }

            extend_segment = op == TurtleOp::Forward;
        }

        if !self.stack.is_empty() {
            let depth = self.stack.len();
            match self.config.underflow {
                UnderflowPolicy::Strict => return Err(TurtleError::UnclosedBranch { depth }),
                UnderflowPolicy::Lenient => {
                    warn!("{depth} branch(es) left open at end of run {}", self.age)
                }
            }
        }

        self.emit();
        debug!(
            "Turtle run {}: {} ops, {} segments, {} leaves, {} handles",
            self.age,
            ops.len(),
            self.segments.len(),
            self.leaves.len(),
            self.handles.len()
        );
        Ok(())
    }

    fn emit(&mut self) {
        let style = self.config.line_style();
        let handles = self.emitter.emit(&self.segments, &self.leaves, &style);
        self.handles.extend(handles);
    }

    fn length_jitter(&mut self) -> f32 {
        let range = self.config.length_randomness;
        uniform(&mut self.rng, -range, range)
    }

    /// Signed bend in radians with its random wobble applied.
    fn bend(&mut self, degrees: f32, randomness: f32, sign: f32) -> f32 {
        let range = match self.config.angle_jitter {
            AngleJitter::Raw => randomness,
            AngleJitter::Radians => randomness.to_radians(),
        };
        (sign * degrees).to_radians() + uniform(&mut self.rng, 0.0, range)
    }

    fn push_branch(&mut self, at: usize) -> Result<(), TurtleError> {
        let max = self.config.max_stack_depth;
        if self.stack.len() < max {
            self.stack.push(self.cursor);
            return Ok(());
        }
        match self.config.underflow {
            UnderflowPolicy::Strict => Err(TurtleError::StackOverflow { index: at, max }),
            UnderflowPolicy::Lenient => {
                warn!("Branch stack full ({max}) at op {at}; push dropped");
                Ok(())
            }
        }
    }

    fn pop_branch(&mut self, at: usize) -> Result<(), TurtleError> {
        if let Some(state) = self.stack.pop() {
            self.cursor = state;
            return Ok(());
        }
        match self.config.underflow {
            UnderflowPolicy::Strict => Err(TurtleError::UnbalancedClose { index: at }),
            UnderflowPolicy::Lenient => {
                warn!("Branch close at op {at} with an empty stack; ignored");
                Ok(())
            }
        }
    }

    // --- Lifecycle ---

    /// Returns the cursor to the home pose and empties the segment and leaf buffers.
    ///
    /// Emitted scene handles are kept; see [`clear`](Self::clear).
    pub fn reset(&mut self) {
        self.cursor = self.home;
        self.segments.clear();
        self.leaves.clear();
    }

    /// Resets, then removes every emitted drawable from the scene.
    ///
    /// Returns the number of handles released.
    pub fn clear(&mut self) -> usize {
        self.reset();
        let handles = std::mem::take(&mut self.handles);
        let removed = handles.len();
        if removed > 0 {
            self.emitter.remove_all(handles);
        }
        removed
    }

    /// Moves both the cursor and the home pose to `position`.
    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.cursor.position = position;
        self.home.position = position;
        self
    }

    /// Replaces the configuration after validating it.
    pub fn set_config(&mut self, config: TurtleConfig) -> Result<(), TurtleError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Unchecked access for per-frame tweaks; the next run validates.
    pub fn config_mut(&mut self) -> &mut TurtleConfig {
        &mut self.config
    }

    // --- Accessors ---

    /// The active configuration.
    pub fn config(&self) -> &TurtleConfig {
        &self.config
    }

    /// Current pose; carries over between runs.
    pub fn cursor(&self) -> &TurtleState {
        &self.cursor
    }

    /// Pose restored by [`reset`](Self::reset) and [`clear`](Self::clear).
    pub fn home(&self) -> &TurtleState {
        &self.home
    }

    /// Segments accumulated since the last reset, in drawing order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Leaf poses accumulated since the last reset.
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Every scene handle returned by the emitter and not yet cleared.
    pub fn handles(&self) -> &[E::Handle] {
        &self.handles
    }

    /// Entries left on the branch stack by the last run.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Bumped at the start of every run, failed ones included; `-1` before the first.
    pub fn age(&self) -> i64 {
        self.age
    }

    /// The emitter this turtle draws into.
    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Mutable access to the emitter, e.g. to hand its scene to a renderer.
    pub fn emitter_mut(&mut self) -> &mut E {
        &mut self.emitter
    }
}
