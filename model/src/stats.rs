use chrono::NaiveDateTime;

use crate::{Point, TraceError, TraceProcessor};

impl TraceProcessor {
    /// Speed between each sample and the previous one, using the actual time between them. The
    /// first entry is always `None`, since there's nothing to compare against.
    pub fn velocity(&self) -> Vec<Option<f64>> {
        let mut series = Vec::with_capacity(self.samples.len());
        if self.samples.is_empty() {
            return series;
        }
        series.push(None);
        for pair in self.samples.windows(2) {
            let dt = seconds_between(pair[0].time, pair[1].time);
            series.push(Some(pair[0].pos.dist_to(pair[1].pos) / dt));
        }
        series
    }

    /// The mean of every defined entry in `velocity()`. None with fewer than 2 samples.
    pub fn mean_speed(&self) -> Option<f64> {
        let speeds: Vec<f64> = self.velocity().into_iter().flatten().collect();
        if speeds.is_empty() {
            return None;
        }
        Some(speeds.iter().sum::<f64>() / speeds.len() as f64)
    }

    /// The center of mass: the mean of all x and all y coordinates.
    pub fn centroid(&self) -> Result<Point, TraceError> {
        if self.samples.is_empty() {
            return Err(TraceError::EmptyTrace);
        }
        let mut x = 0.0;
        let mut y = 0.0;
        for sample in &self.samples {
            x += sample.pos.x;
            y += sample.pos.y;
        }
        let n = self.samples.len() as f64;
        Ok(Point::new(x / n, y / n))
    }

    /// Distance from the centroid to each point, in the same order.
    pub fn distances_to(&self, points: &[Point]) -> Result<Vec<f64>, TraceError> {
        let centroid = self.centroid()?;
        Ok(points.iter().map(|pt| pt.dist_to(centroid)).collect())
    }

    /// The (min, max) corners of an axis-aligned box around all samples
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = self.samples.first()?.pos;
        let mut min = first;
        let mut max = first;
        for sample in &self.samples {
            min.x = min.x.min(sample.pos.x);
            min.y = min.y.min(sample.pos.y);
            max.x = max.x.max(sample.pos.x);
            max.y = max.y.max(sample.pos.y);
        }
        Some((min, max))
    }
}

fn seconds_between(t1: NaiveDateTime, t2: NaiveDateTime) -> f64 {
    let dt = t2 - t1;
    match dt.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        // More than a few centuries apart
        None => dt.num_milliseconds() as f64 / 1e3,
    }
}
