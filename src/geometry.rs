//! Umbral shadow ellipse derivation
use std::f64::consts::{FRAC_PI_2, PI};

use log::debug;
use thiserror::Error;

use crate::coords::round3;
use crate::track::{Position, Track};

/// IUGG mean Earth radius [m]
pub(crate) const MEAN_EARTH_RADIUS: f64 = 6371008.8;

/// Waypoint role within a table row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waypoint {
    North,
    Central,
    South,
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::North => write!(f, "north"),
            Self::Central => write!(f, "central"),
            Self::South => write!(f, "south"),
        }
    }
}

/// Data integrity errors: the input violates the single fixed schema
/// this crate supports, and no ellipse can honestly be derived.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("missing start limit record")]
    MissingStartLimit,
    #[error("missing end limit record")]
    MissingEndLimit,
    #[error("unresolved {waypoint} position at sample {index}")]
    UnresolvedPosition { waypoint: Waypoint, index: usize },
    #[error("unresolved sun altitude at sample {0}")]
    UnresolvedSunAltitude(usize),
}

/// Sample geometry inputs after limit backfill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResolvedSample {
    pub(crate) north: Position,
    pub(crate) central: Position,
    pub(crate) south: Position,
    pub(crate) sun_altitude: f64,
}

/// Backfills absent waypoints from the limit records.
///
/// Missing edge waypoints only occur near the event's temporal
/// boundaries, where the true boundary data is the best available
/// substitute: samples in the first half of the sequence fall back on
/// the start limit, the midpoint and later on the end limit. The sun
/// altitude falls back the same way. Anything still unresolved is a
/// fatal integrity error, never a fabricated zero.
pub(crate) fn resolve(track: &Track) -> Result<Vec<ResolvedSample>, Error> {
    let start = track.start_limit().ok_or(Error::MissingStartLimit)?;
    let end = track.end_limit().ok_or(Error::MissingEndLimit)?;
    let len = track.samples().len();

    track
        .samples()
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let limit = if index < len / 2 { start } else { end };
            let waypoint = |value: Option<Position>, fallback: Option<Position>, waypoint| {
                value
                    .or(fallback)
                    .ok_or(Error::UnresolvedPosition { waypoint, index })
            };
            Ok(ResolvedSample {
                north: waypoint(sample.north, limit.north, Waypoint::North)?,
                central: waypoint(sample.central, limit.central, Waypoint::Central)?,
                south: waypoint(sample.south, limit.south, Waypoint::South)?,
                sun_altitude: sample
                    .sun_altitude
                    .or(limit.sun_altitude)
                    .ok_or(Error::UnresolvedSunAltitude(index))?,
            })
        })
        .collect()
}

/// Umbral/antumbral shadow footprint approximation for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseFrame {
    /// Semi major axis [m]
    pub semi_major_m: f64,
    /// Semi minor axis [m]
    pub semi_minor_m: f64,
    /// Major axis rotation [rad], in (-pi, pi]
    pub rotation_rad: f64,
}

/// Derives one [EllipseFrame] per sample.
pub(crate) fn frames(track: &Track) -> Result<Vec<EllipseFrame>, Error> {
    let resolved = resolve(track)?;
    debug!("{}: deriving {} ellipse frames", track.date, resolved.len());
    Ok(resolved.iter().map(frame).collect())
}

/// Derives the shadow ellipse of one resolved sample.
///
/// The semi major axis is half the geodesic north-to-south distance.
/// The minor axis shrinks it by `sun_altitude / 90`, a foreshortening
/// heuristic for how obliquely the shadow strikes the surface, and the
/// rotation is the north-to-south bearing plus a quarter turn so the
/// major axis lies across the path. Both are the upstream project's
/// acknowledged approximations, kept as-is.
pub(crate) fn frame(resolved: &ResolvedSample) -> EllipseFrame {
    let semi_major = great_circle_distance(resolved.north, resolved.south) / 2.0;
    let semi_minor = semi_major * resolved.sun_altitude / 90.0;
    let rotation = wrap_pi(initial_bearing(resolved.north, resolved.south) + FRAC_PI_2);
    EllipseFrame {
        semi_major_m: round3(semi_major),
        semi_minor_m: round3(semi_minor),
        rotation_rad: round3(rotation),
    }
}

/// Great-circle surface distance [m] between two ground points, on the
/// mean Earth radius.
pub(crate) fn great_circle_distance(a: Position, b: Position) -> f64 {
    let (lat_a, lat_b) = (a.lat.to_radians(), b.lat.to_radians());
    let half_dlat = (lat_b - lat_a) / 2.0;
    let half_dlon = (b.lon - a.lon).to_radians() / 2.0;
    let h = half_dlat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_dlon.sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS * h.sqrt().asin()
}

/// Initial bearing [rad] of the great circle from `a` to `b`.
pub(crate) fn initial_bearing(a: Position, b: Position) -> f64 {
    let (lat_a, lat_b) = (a.lat.to_radians(), b.lat.to_radians());
    let dlon = (b.lon - a.lon).to_radians();
    let y = dlon.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * dlon.cos();
    y.atan2(x)
}

/// Wraps an angle into (-pi, pi].
fn wrap_pi(angle: f64) -> f64 {
    let mut wrapped = angle;
    while wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    while wrapped <= -PI {
        wrapped += 2.0 * PI;
    }
    wrapped
}
