//! # symbios-arbor
//!
//! A 3D turtle interpreter for [Symbios](https://crates.io/crates/symbios) that grows
//! plant skeletons from L-System instruction streams.
//!
//! The grammar decides *what* grows; the [`Turtle`] decides *where*. It walks the derived
//! string, moving a cursor with a position, heading and up vector, saving and restoring it
//! on `[`/`]`, pruning branches on `%`, and collecting line [`Segment`]s and [`Leaf`]
//! markers. Each run hands the result to a [`GeometryEmitter`], such as the bundled
//! [`LineScene`], so the output can be ingested by game engines (Bevy), web viewers, or
//! plotters without this crate knowing about any of them.

pub mod error;
pub mod interpreter;
pub mod scene;
pub mod turtle;

pub use error::*;
pub use interpreter::*;
pub use scene::*;
pub use turtle::*;
