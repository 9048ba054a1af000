//! Map rendering for trend results.
//!
//! Implements:
//! - Polygon layers from GeoJSON, with attribute joins
//! - Colormaps and the center-zero normalization decision
//! - Choropleth figures with significance overlays and a colorbar
//! - Web-tile basemaps
//! - PNG encoding with dpi metadata

pub mod basemap;
pub mod choropleth;
pub mod colormap;
pub mod error;
pub mod layer;
pub mod norm;
pub mod png;
pub mod text;
pub mod ticks;
pub mod viewport;

pub use basemap::{HttpTileSource, TileSource, CARTO_POSITRON_URL};
pub use choropleth::{render_map, MapConfig, RenderedMap, SignificanceConfig};
pub use colormap::{Color, Colormap};
pub use error::{RenderError, RenderResult};
pub use layer::{LayerFeature, SpatialLayer};
pub use norm::{data_bounds, resolve_color_scale, ColorScale, Normalization};
pub use text::{TextRenderer, NO_FONT_WARNING};
pub use viewport::Viewport;
