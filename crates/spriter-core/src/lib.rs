//! CSS sprite sheet generation.
//!
//! Takes a stylesheet whose rules reference many individual background
//! images, packs those images into one composite sheet per density variant,
//! and rewrites the rules to point at the sheet with the correct
//! `background-position` / `background-size` offsets. High-density (`@2x`)
//! variants are packed separately and their offsets emitted at half scale.
//!
//! # Example
//!
//! ```no_run
//! use spriter_core::{generate, Options, Stylesheet};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let css = std::fs::read_to_string("style.css")?;
//! let mut stylesheet = Stylesheet::parse(&css)?;
//!
//! let report = generate(
//!     &mut stylesheet,
//!     &Options {
//!         source_root: "public".into(),
//!         target: "images/sprites.png".into(),
//!         filter: None,
//!         optimize: true,
//!     },
//! )
//! .await?;
//!
//! for failure in &report.failures {
//!     eprintln!("error loading {}", failure.path.display());
//! }
//! print!("{}", stylesheet.to_css());
//! # Ok(()) }
//! ```

pub mod collect;
pub mod group;
pub mod load;
pub mod optimize;
pub mod packer;
pub mod pipeline;
pub mod png;
pub mod render;
pub mod rewrite;
pub mod stylesheet;

pub use pipeline::{generate, GenerateError, Options, Report, Sheet, SheetSummary};
pub use stylesheet::{ParseError, Stylesheet};
