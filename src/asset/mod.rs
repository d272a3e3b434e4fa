//! Asset classes and the pipelines that build them.
//!
//! # Module Structure
//!
//! ```text
//! asset/
//! ├── class.rs     # AssetClass, AssetKind, MinifyRule
//! ├── stage.rs     # Stage trait, StageError
//! ├── style.rs     # compile / prefix / rem-fallback stages
//! ├── minify.rs    # CSS and JS minifier stages
//! └── pipeline.rs  # Pipeline, factories, BuildReport
//! ```

mod class;
pub mod minify;
mod pipeline;
mod stage;
pub mod style;


pub use class::{AssetClass, AssetKind, MinifyRule};
pub use pipeline::{BuildReport, Pipeline, PipelineError};
pub use stage::{Stage, StageError};
