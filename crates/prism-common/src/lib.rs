//! Common types and utilities shared across the PRISM trend toolkit.

pub mod bbox;
pub mod calendar;
pub mod crs;
pub mod error;
pub mod geotransform;
pub mod tile;

pub use bbox::BoundingBox;
pub use calendar::{irrigation_labels, IrrigationLabels, IrrigationYear, WaterYear, YearMonth};
pub use crs::{lat_to_mercator_y, lon_to_mercator_x, mercator_y_to_lat, CrsCode};
pub use error::{CommonError, CommonResult};
pub use geotransform::GeoTransform;
pub use tile::{web_mercator_zoom_for, TileCoord, WEB_MERCATOR_MAX_EXTENT};
