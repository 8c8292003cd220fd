//! Data model shared by the collectors, the merger and the feature deriver.
//!
//! Layout elements are a closed set of three kinds (text line, image, table);
//! feature rows flatten them into one fixed column set for labeling and
//! external classifiers.

mod document;
mod element;
mod feature;
mod geometry;

pub use document::Metadata;
pub use element::{ElementKind, ImageElement, LayoutElement, TableElement, TextElement};
pub use feature::{FeatureRow, Label};
pub use geometry::BoundingBox;
