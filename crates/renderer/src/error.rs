//! Error types for map rendering.

use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that abort a render.
///
/// A color-scale fallback or a failed basemap tile is not an error; those
/// are reported as warnings on the rendered map.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Attribute column not present on any feature
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Layer has no drawable features or no finite values
    #[error("Empty layer: {0}")]
    EmptyLayer(String),

    /// Coordinates could not be projected
    #[error("Projection error: {0}")]
    Projection(String),

    /// Colormap name not recognized
    #[error("Unknown colormap: {0}")]
    UnknownColormap(String),

    /// Canvas allocation or drawing failed
    #[error("Canvas error: {0}")]
    Canvas(String),

    /// PNG encoding failed
    #[error("PNG encoding error: {0}")]
    Png(String),

    /// GeoJSON input could not be parsed
    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    /// Font file could not be loaded
    #[error("Font error: {0}")]
    Font(String),

    /// Basemap tile request failed
    #[error("Basemap error: {0}")]
    Basemap(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
