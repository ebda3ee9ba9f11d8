use crate::core::errors::{PathError, SimError};
use anyhow::Context;
use helpers::general::lin_interp;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// Coordinates of the finish line, i.e. the end of the built-in circuit.
pub const FINISH_X: f64 = 1069.338623046875;
pub const FINISH_Y: f64 = -98.19002532958984;

/// Corners of the built-in circuit relative to the finish line. The first and the last point are
/// the finish line itself such that the path is closed.
const CIRCUIT_OFFSETS: [[f64; 2]; 10] = [
    [0.0, 0.0],
    [180.0, 0.0],
    [240.0, 60.0],
    [240.0, 360.0],
    [180.0, 420.0],
    [-520.0, 420.0],
    [-580.0, 360.0],
    [-580.0, 60.0],
    [-520.0, 0.0],
    [0.0, 0.0],
];

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    pub fn dist_squared(&self, other: &Point) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }
}

/// PathSampler maps a scalar distance along a path to a 2D point. The race only sees the track
/// through this trait.
pub trait PathSampler {
    /// total_length returns the length of the path.
    fn total_length(&self) -> f64;

    /// point_at_length returns the point at distance d along the path.
    fn point_at_length(&self, d: f64) -> Result<Point, PathError>;
}

/// Centerline element as contained in a track csv file.
#[derive(Debug, Deserialize, Clone)]
pub struct CsvTrackEl {
    pub x_m: f64,
    pub y_m: f64,
    #[serde(default)]
    pub w_tr_left_m: f64,
    #[serde(default)]
    pub w_tr_right_m: f64,
}

/// Track is a polyline sampled by arc length.
#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    xs: Vec<f64>,
    ys: Vec<f64>,
    s: Vec<f64>,
}

impl Track {
    pub fn new(name: &str, points: &[Point]) -> Result<Track, SimError> {
        if points.len() < 2 {
            return Err(SimError::TooFewTrackPoints(points.len()));
        }

        if let Some(idx) = points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(SimError::NonFiniteTrackPoint(idx));
        }

        // cumulative arc length at every point
        let mut s = Vec::with_capacity(points.len());
        s.push(0.0);

        for pair in points.windows(2) {
            let s_prev = *s.last().unwrap();
            s.push(s_prev + pair[0].dist_squared(&pair[1]).sqrt());
        }

        let length = *s.last().unwrap();
        if !(length > 0.0) || !length.is_finite() {
            return Err(SimError::InvalidPathLength(length));
        }

        Ok(Track {
            name: name.to_owned(),
            xs: points.iter().map(|p| p.x).collect(),
            ys: points.iter().map(|p| p.y).collect(),
            s,
        })
    }

    /// builtin_circuit returns the fixed circuit the race is driven on by default.
    pub fn builtin_circuit() -> Track {
        let points: Vec<Point> = CIRCUIT_OFFSETS
            .iter()
            .map(|o| Point::new(FINISH_X + o[0], FINISH_Y + o[1]))
            .collect();

        Track::new("Aegis Circuit", &points).expect("Built-in circuit must be valid!")
    }

    /// from_csv loads a centerline from a csv file with columns x_m, y_m (and optional track
    /// widths, which are ignored).
    pub fn from_csv(trackfile_path: &Path) -> anyhow::Result<Track> {
        let fh = OpenOptions::new()
            .read(true)
            .open(trackfile_path)
            .context(format!(
                "Failed to open track file {}!",
                trackfile_path.to_str().unwrap_or("unknown")
            ))?;

        let mut csv_reader = csv::Reader::from_reader(&fh);
        let mut points: Vec<Point> = vec![];

        for result in csv_reader.deserialize() {
            let csv_track_el: CsvTrackEl = result.context("Failed to parse track file row!")?;
            points.push(Point::new(csv_track_el.x_m, csv_track_el.y_m));
        }

        let name = trackfile_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_owned());

        Ok(Track::new(&name, &points)?)
    }

    /// end returns the last point of the path. On a closed circuit this is where laps are
    /// counted.
    pub fn end(&self) -> Point {
        Point::new(self.xs[self.xs.len() - 1], self.ys[self.ys.len() - 1])
    }
}

impl PathSampler for Track {
    fn total_length(&self) -> f64 {
        *self.s.last().unwrap()
    }

    fn point_at_length(&self, d: f64) -> Result<Point, PathError> {
        if !d.is_finite() {
            return Err(PathError::NonFinite(d));
        }

        let length = self.total_length();
        if d < 0.0 || d > length {
            return Err(PathError::OutOfRange {
                distance: d,
                length,
            });
        }

        Ok(Point::new(
            lin_interp(d, &self.s, &self.xs),
            lin_interp(d, &self.s, &self.ys),
        ))
    }
}
