use std::path::Path;

use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};

use model::{Point, TraceProcessor};

const TRACE_COLOR: &str = "#1f77b4";
const CENTROID_COLOR: &str = "orange";
const REFERENCE_COLOR: &str = "green";

/// The trace as a line, the centroid, and optionally the reference points, as GeoJSON in the
/// trace's own coordinates. Styled with simplestyle properties, so most GeoJSON viewers draw it.
pub fn render(trace: &TraceProcessor, centroid: Point, points: Option<&[Point]>) -> GeoJson {
    let positions: Vec<Vec<f64>> = trace
        .samples()
        .iter()
        .map(|sample| position(sample.pos))
        .collect();
    // A LineString needs at least two positions
    let trace_geometry = if positions.len() >= 2 {
        Value::LineString(positions)
    } else {
        Value::MultiPoint(positions)
    };

    let mut trace_feature = make_feature(trace_geometry, "data", TRACE_COLOR);
    trace_feature.bbox = trace
        .bounds()
        .map(|(min, max)| vec![min.x, min.y, max.x, max.y]);

    let mut features = vec![
        trace_feature,
        make_feature(Value::Point(position(centroid)), "COM", CENTROID_COLOR),
    ];
    if let Some(points) = points {
        features.push(make_feature(
            Value::MultiPoint(points.iter().map(|pt| position(*pt)).collect()),
            "predefined",
            REFERENCE_COLOR,
        ));
    }

    GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

/// Returns false without touching anything if the file already exists.
pub fn write_plot(path: &Path, plot: &GeoJson) -> Result<bool> {
    if path.exists() {
        warn!(
            "{} already exists. Pick a different name to save the plot.",
            path.display()
        );
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        fs_err::create_dir_all(dir)?;
    }
    fs_err::write(path, serde_json::to_string_pretty(plot)?)?;
    info!("Wrote plot to {}", path.display());
    Ok(true)
}

fn position(pt: Point) -> Vec<f64> {
    vec![pt.x, pt.y]
}

fn make_feature(geometry: Value, name: &str, color: &str) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), name.into());
    properties.insert("stroke".to_string(), color.into());
    properties.insert("marker-color".to_string(), color.into());
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
