use std::f64::consts::PI;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use model::Point;

/// Generated points sit on `r(t) = DEFAULT_CURVE_RADIUS + cos(t)` unless told otherwise
pub const DEFAULT_CURVE_RADIUS: f64 = 6.0;

/// Reads reference points from delimited text with `x` and `y` columns. Other columns, like a
/// row index, are ignored.
pub fn load_points<R: std::io::Read>(reader: R, delimiter: u8) -> Result<Vec<Point>> {
    let mut points = Vec::new();
    for rec in csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
    {
        let rec: Record = rec?;
        if !rec.x.is_finite() || !rec.y.is_finite() {
            bail!("Reference point {} isn't finite: ({}, {})", points.len(), rec.x, rec.y);
        }
        points.push(Point::new(rec.x, rec.y));
    }
    Ok(points)
}

pub fn load_points_file<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<Point>> {
    let path = path.as_ref();
    let points = load_points(crate::open(path)?, delimiter)?;
    info!("Loaded {} reference points from {}", points.len(), path.display());
    Ok(points)
}

/// `n` points evenly spaced in angle around the closed curve `r(t) = radius + cos(t)`, starting
/// and ending at `t = 0`.
pub fn generate_points(n: usize, radius: f64) -> Vec<Point> {
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let t = if n == 1 {
            0.0
        } else {
            2.0 * PI * (i as f64) / ((n - 1) as f64)
        };
        let r = radius + t.cos();
        points.push(Point::new(r * t.cos(), r * t.sin()));
    }
    points
}

/// Writes comma-separated points with a leading row index column
pub fn save_points<W: std::io::Write>(writer: W, points: &[Point]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for (index, pt) in points.iter().enumerate() {
        writer.serialize(Row {
            index,
            x: pt.x,
            y: pt.y,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_points_file<P: AsRef<Path>>(path: P, points: &[Point]) -> Result<()> {
    let path = path.as_ref();
    save_points(fs_err::File::create(path)?, points)?;
    info!("Saved {} reference points to {}", points.len(), path.display());
    Ok(())
}

#[derive(Deserialize)]
struct Record {
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct Row {
    #[serde(rename = "")]
    index: usize,
    x: f64,
    y: f64,
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn load_with_index_column() {
        let input = ";x;y\n0;1;1\n1;2;2\n2;3;3\n3;4;4\n";
        let points = load_points(input.as_bytes(), b';').unwrap();
        assert_eq!(
            points,
            vec![
                Point::new(1.0, 1.0),
                Point::new(2.0, 2.0),
                Point::new(3.0, 3.0),
                Point::new(4.0, 4.0)
            ]
        );
    }

    #[test]
    fn load_with_padded_headers() {
        let input = "x; y\n1; 2\n3 ;4\n";
        let points = load_points(input.as_bytes(), b';').unwrap();
        assert_eq!(points, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }

    #[test]
    fn load_without_y() {
        let input = "x\n1\n";
        assert!(load_points(input.as_bytes(), b',').is_err());
    }

    #[test]
    fn generated_curve() {
        let points = generate_points(5, DEFAULT_CURVE_RADIUS);
        assert_eq!(points.len(), 5);
        // t = 0 and t = 2pi both land on (radius + 1, 0)
        assert_abs_diff_eq!(points[0].x, 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(points[0].y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(points[4].x, 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(points[4].y, 0.0, epsilon = 1e-9);
        // t = pi/2: r = radius
        assert_abs_diff_eq!(points[1].x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(points[1].y, 6.0, epsilon = 1e-9);
        // t = pi: r = radius - 1, on the negative x axis
        assert_abs_diff_eq!(points[2].x, -5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(points[2].y, 0.0, epsilon = 1e-9);

        assert!(generate_points(0, DEFAULT_CURVE_RADIUS).is_empty());
        assert_eq!(generate_points(1, 2.0), vec![Point::new(3.0, 0.0)]);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        let points = generate_points(10, DEFAULT_CURVE_RADIUS);
        save_points_file(&path, &points).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with(",x,y\n0,"));
        assert_eq!(load_points_file(&path, b',').unwrap(), points);
    }
}
