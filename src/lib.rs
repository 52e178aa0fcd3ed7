//! Scene graph and input engine for browser canvas games.
//!
//! A game is a [`scene::Scene`] of named, levelled elements. Each element
//! carries drawables (shapes, text, images, sprite strips), circular
//! hitboxes for collision checks, and listeners for pointer, hold and key
//! events. Pointer picks are pixel-accurate: an element is hit when the
//! point lands on a pixel it actually paints, tested on an off-screen
//! scratch surface.
//!
//! The engine core is plain Rust and runs under `cargo test` against the
//! in-memory [`raster::RasterSurface`]. The [`web`] module binds it to a real
//! `<canvas>`, DOM events and browser timers.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::GameCore`]: gestures, timers, key state, frame loop |
//! | [`scene`] | Element store, level ordering, names, copies, collisions |
//! | [`composite`] | Composite membership and group rotation |
//! | [`element`] | Elements, interaction flags and listener registration |
//! | [`drawable`] | Drawables and their local transforms |
//! | [`shape`] | Rectangle, oval, polygon and line geometry |
//! | [`hitbox`] | Circular collision hitboxes |
//! | [`listener`] | Event kinds, callbacks and stagger counters |
//! | [`input`] | Keys and the pointer gesture state machine |
//! | [`hit`] | Pixel-accurate picking |
//! | [`render`] | Scene drawing and the hitbox overlay |
//! | [`surface`] | The 2D drawing surface abstraction |
//! | [`raster`] | Software surface used for scratch work and tests |
//! | [`asset`] | Asynchronously loaded bitmaps and sprite-sheet metadata |
//! | [`geom`] | Validated points and `kurbo::Affine` helpers |
//! | [`config`] | Timer intervals and pick policy |
//! | [`consts`] | Shared constants (default intervals, overlay widths, fonts) |
//! | [`error`] | Crate error type |
//! | [`web`] | Browser binding: canvas surface, DOM listeners, loaders |

pub mod asset;
pub mod composite;
pub mod config;
pub mod consts;
pub mod drawable;
pub mod element;
pub mod engine;
pub mod error;
pub mod geom;
pub mod hit;
pub mod hitbox;
pub mod input;
pub mod listener;
pub mod raster;
pub mod render;
pub mod scene;
pub mod shape;
pub mod surface;
pub mod web;
