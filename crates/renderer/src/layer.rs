//! Polygon layers with per-feature attributes.

use std::collections::BTreeMap;
use std::path::Path;

use geo::{BoundingRect, Centroid, Coord, LineString, MapCoords, MultiPolygon, Point, Polygon};
use geojson::{GeoJson, Value};
use prism_common::crs::WEB_MERCATOR_MAX_LAT;
use prism_common::{BoundingBox, CrsCode};
use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};

/// One polygon feature.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerFeature {
    pub geometry: MultiPolygon<f64>,
    /// Numeric properties
    pub numbers: BTreeMap<String, f64>,
    /// String properties, used as join keys
    pub text: BTreeMap<String, String>,
}

impl LayerFeature {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self {
            geometry,
            numbers: BTreeMap::new(),
            text: BTreeMap::new(),
        }
    }

    pub fn with_number(mut self, name: impl Into<String>, value: f64) -> Self {
        self.numbers.insert(name.into(), value);
        self
    }

    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.insert(name.into(), value.into());
        self
    }

    /// Numeric attribute, NaN when absent.
    pub fn number(&self, name: &str) -> f64 {
        self.numbers.get(name).copied().unwrap_or(f64::NAN)
    }

    /// Property as a join key; integer-valued numbers print without a fraction.
    pub fn key(&self, name: &str) -> Option<String> {
        if let Some(s) = self.text.get(name) {
            return Some(s.clone());
        }
        self.numbers.get(name).map(|v| {
            if v.fract() == 0.0 && v.abs() < 1e15 {
                format!("{}", *v as i64)
            } else {
                v.to_string()
            }
        })
    }

    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }
}

/// A set of polygon features in one CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialLayer {
    pub crs: CrsCode,
    pub features: Vec<LayerFeature>,
}

impl SpatialLayer {
    pub fn new(crs: CrsCode, features: Vec<LayerFeature>) -> Self {
        Self { crs, features }
    }

    /// Parse a GeoJSON FeatureCollection (or single Feature).
    ///
    /// Polygon and MultiPolygon features are kept; other geometry types are
    /// skipped with a warning. Coordinates are taken to be in `crs`.
    pub fn from_geojson_str(text: &str, crs: CrsCode) -> RenderResult<Self> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| RenderError::GeoJson(e.to_string()))?;

        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => {
                return Err(RenderError::GeoJson(
                    "expected a Feature or FeatureCollection".to_string(),
                ))
            }
        };

        let mut layer = Vec::with_capacity(features.len());
        let mut skipped = 0usize;

        for feature in features {
            let geometry = feature.geometry.as_ref().and_then(|g| to_multipolygon(&g.value));
            let Some(geometry) = geometry else {
                skipped += 1;
                continue;
            };

            let mut out = LayerFeature::new(geometry);
            if let Some(props) = &feature.properties {
                for (name, value) in props {
                    match value {
                        serde_json::Value::Number(n) => {
                            if let Some(v) = n.as_f64() {
                                out.numbers.insert(name.clone(), v);
                            }
                        }
                        serde_json::Value::String(s) => {
                            out.text.insert(name.clone(), s.clone());
                        }
                        _ => {}
                    }
                }
            }
            layer.push(out);
        }

        if skipped > 0 {
            warn!(skipped = skipped, "Skipped features without polygon geometry");
        }
        debug!(features = layer.len(), crs = %crs, "Parsed GeoJSON layer");

        Ok(Self::new(crs, layer))
    }

    pub fn from_geojson_file(path: &Path, crs: CrsCode) -> RenderResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&text, crs)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// True when at least one feature carries the numeric column.
    pub fn has_column(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.numbers.contains_key(name))
    }

    /// Values of a numeric column, NaN where a feature lacks it.
    pub fn values(&self, column: &str) -> RenderResult<Vec<f64>> {
        if !self.has_column(column) {
            return Err(RenderError::MissingColumn(column.to_string()));
        }
        Ok(self.features.iter().map(|f| f.number(column)).collect())
    }

    /// Extent of all features.
    pub fn bounds(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for rect in self.features.iter().filter_map(|f| f.geometry.bounding_rect()) {
            bbox.expand(rect.min().x, rect.min().y);
            bbox.expand(rect.max().x, rect.max().y);
        }
        bbox
    }

    /// Copy of the layer in web mercator. A layer already in EPSG:3857 is
    /// returned unchanged.
    pub fn to_web_mercator(&self) -> RenderResult<SpatialLayer> {
        if self.crs == CrsCode::Epsg3857 {
            return Ok(self.clone());
        }

        let bounds = self.bounds();
        if !bounds.is_empty() && (bounds.min_y < -90.0 || bounds.max_y > 90.0) {
            return Err(RenderError::Projection(format!(
                "latitude range {:.3}..{:.3} outside [-90, 90] for {}",
                bounds.min_y, bounds.max_y, self.crs
            )));
        }
        let past_limit =
            bounds.min_y < -WEB_MERCATOR_MAX_LAT || bounds.max_y > WEB_MERCATOR_MAX_LAT;
        if !bounds.is_empty() && past_limit {
            warn!(crs = %self.crs, "Layer extends past web-mercator latitude limit; clamping");
        }

        let crs = self.crs;
        let features = self
            .features
            .iter()
            .map(|f| {
                let geometry = f.geometry.map_coords(|c| {
                    let (x, y) = crs.to_web_mercator(c.x, c.y);
                    Coord { x, y }
                });
                LayerFeature {
                    geometry,
                    numbers: f.numbers.clone(),
                    text: f.text.clone(),
                }
            })
            .collect();

        Ok(SpatialLayer::new(CrsCode::Epsg3857, features))
    }

    /// Copy numeric columns from `table` onto features whose `key_property`
    /// matches a table key. Returns the number of features matched.
    pub fn join_attributes(
        &mut self,
        key_property: &str,
        table: &BTreeMap<String, BTreeMap<String, f64>>,
    ) -> usize {
        let mut matched = 0;
        for feature in &mut self.features {
            let Some(row) = feature.key(key_property).and_then(|k| table.get(&k)) else {
                continue;
            };
            for (name, value) in row {
                feature.numbers.insert(name.clone(), *value);
            }
            matched += 1;
        }

        if matched < self.features.len() {
            debug!(
                key = key_property,
                matched = matched,
                features = self.features.len(),
                "Some features had no matching table row"
            );
        }
        matched
    }
}

fn ring(coords: &[Vec<f64>]) -> LineString<f64> {
    coords
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect::<Vec<_>>()
        .into()
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(Polygon::new(
        ring(exterior),
        interiors.iter().map(|r| ring(r)).collect(),
    ))
}

fn to_multipolygon(value: &Value) -> Option<MultiPolygon<f64>> {
    match value {
        Value::Polygon(rings) => polygon(rings).map(|p| MultiPolygon::new(vec![p])),
        Value::MultiPolygon(polys) => {
            let polys: Vec<Polygon<f64>> = polys.iter().filter_map(|p| polygon(p)).collect();
            (!polys.is_empty()).then(|| MultiPolygon::new(polys))
        }
        _ => None,
    }
}
