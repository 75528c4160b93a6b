//! CZML document assembly
use hifitime::Epoch;
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::geometry::{self, EllipseFrame};
use crate::row;
use crate::track::{EclipseType, LimitRecord, Position, Sample, Track};

/// Animation rate: 300x real time.
const CLOCK_MULTIPLIER: u32 = 300;
/// Viewer altitude above the track midpoint [m]
const CAMERA_ALTITUDE: f64 = 10_000_000.0;
/// Shadow ellipse outline sampling granularity [rad]
const ELLIPSE_GRANULARITY: f64 = 0.002;
/// North/south limit polylines: thin solid white
const LIMIT_RGBA: [u8; 4] = [255, 255, 255, 128];
/// Central polyline: thick amber glow
const CENTRAL_RGBA: [u8; 4] = [223, 150, 47, 128];
const CENTRAL_GLOW_POWER: f64 = 0.25;
/// Shadow ellipse fill: translucent black
const SHADOW_RGBA: [u8; 4] = [0, 0, 0, 160];

#[derive(Debug, Error)]
pub enum Error {
    /// Track holds no samples: nothing to animate.
    #[error("track contains no samples")]
    EmptyTrack,
    /// A recorded sample carries a time literal that no longer parses.
    #[error("invalid time literal \"{0}\"")]
    InvalidTime(String),
    /// Input violates the fixed upstream schema.
    #[error(transparent)]
    Geometry(#[from] geometry::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// CZML packet stream describing one eclipse track.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Document {
    pub packets: Vec<Packet>,
}

impl Document {
    /// Serializes the packet stream as a JSON array.
    pub fn dumps(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One CZML packet; exactly one payload member is set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Packet {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<Clock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline: Option<Polyline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<SampledPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ellipse: Option<Ellipse>,
}

/// Document animation clock.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clock {
    pub multiplier: u32,
    pub range: &'static str,
    pub step: &'static str,
    pub current_time: String,
    /// ISO8601 "start/end" span
    pub interval: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Polyline {
    pub show: bool,
    pub width: f64,
    pub follow_surface: bool,
    pub material: Material,
    pub positions: Positions,
}

/// Flat [lon, lat, alt, ..] vertex run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Positions {
    pub cartographic_degrees: Vec<f64>,
}

/// Epoch-tagged flat [t, lon, lat, alt, ..] vertex series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledPosition {
    pub epoch: String,
    pub cartographic_degrees: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solid_color: Option<SolidColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline_glow: Option<PolylineGlow>,
}

impl Material {
    fn solid(rgba: [u8; 4]) -> Self {
        Self {
            solid_color: Some(SolidColor {
                color: Color { rgba },
            }),
            ..Default::default()
        }
    }
    fn glow(rgba: [u8; 4], glow_power: f64) -> Self {
        Self {
            polyline_glow: Some(PolylineGlow {
                color: Color { rgba },
                glow_power,
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SolidColor {
    pub color: Color,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineGlow {
    pub color: Color,
    pub glow_power: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Color {
    pub rgba: [u8; 4],
}

/// Shadow ellipse: every series is epoch-tagged [t, value, ..] pairs,
/// piecewise-linear interpolated by the CZML default.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ellipse {
    pub semi_major_axis: Series,
    pub semi_minor_axis: Series,
    pub rotation: Series,
    pub material: Material,
    pub fill: bool,
    pub show: bool,
    pub granularity: f64,
}

/// Epoch-tagged numeric series.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub epoch: String,
    pub number: Vec<f64>,
}

/// Values not representable in the CZML stream itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(rename = "type")]
    pub eclipse_type: EclipseType,
    /// [lon °, lat °, altitude m]
    pub camera_position: [f64; 3],
}

impl Track {
    /// Per-sample shadow ellipse parameters, derived on demand.
    pub fn ellipse_frames(&self) -> Result<Vec<EllipseFrame>, Error> {
        Ok(geometry::frames(self)?)
    }

    /// Viewer position above the track midpoint: backfilled central
    /// line position at index `round(len / 2)`, 10 000 km up.
    pub fn camera_position(&self) -> Result<[f64; 3], Error> {
        let resolved = geometry::resolve(self)?;
        if resolved.is_empty() {
            return Err(Error::EmptyTrack);
        }
        let index = ((resolved.len() as f64) / 2.0).round() as usize;
        let center = resolved[index.min(resolved.len() - 1)].central;
        Ok([center.lon, center.lat, CAMERA_ALTITUDE])
    }

    /// Event summary for consumers of the CZML document.
    pub fn metadata(&self) -> Result<Metadata, Error> {
        Ok(Metadata {
            eclipse_type: self.eclipse_type,
            camera_position: self.camera_position()?,
        })
    }

    /// Assembles the CZML packet stream: animation clock, the three
    /// limit-to-limit polylines, and the time-tagged shadow ellipse
    /// following the central line.
    pub fn czml(&self) -> Result<Document, Error> {
        if self.samples().is_empty() {
            return Err(Error::EmptyTrack);
        }
        let resolved = geometry::resolve(self)?;
        let frames: Vec<EllipseFrame> = resolved.iter().map(geometry::frame).collect();

        let times: Vec<(u8, u8)> = self
            .samples()
            .iter()
            .map(|sample| {
                row::time_of_day(&sample.time).ok_or_else(|| Error::InvalidTime(sample.time.clone()))
            })
            .collect::<Result<_, _>>()?;
        let epochs: Vec<Epoch> = times
            .iter()
            .map(|&(hours, minutes)| self.date.epoch_at(hours, minutes))
            .collect();
        let (first, last) = epochs
            .iter()
            .position_minmax()
            .into_option()
            .ok_or(Error::EmptyTrack)?;

        let iso = self.date.iso();
        let document_epoch = self.date.iso_at(times[first].0, times[first].1);
        let interval = format!(
            "{}/{}",
            document_epoch,
            self.date.iso_at(times[last].0, times[last].1)
        );
        debug!("{}: assembling CZML over {}", self.date, interval);

        let mut packets = Vec::with_capacity(5);
        packets.push(Packet {
            id: format!("{}_clock", iso),
            clock: Some(Clock {
                multiplier: CLOCK_MULTIPLIER,
                range: "LOOP_STOP",
                step: "SYSTEM_CLOCK_MULTIPLIER",
                current_time: document_epoch.clone(),
                interval,
            }),
            ..Default::default()
        });

        type SamplePick = fn(&Sample) -> Option<Position>;
        type LimitPick = fn(&LimitRecord) -> Option<Position>;
        let polylines: [(&str, f64, Material, SamplePick, LimitPick); 3] = [
            (
                "north",
                1.0,
                Material::solid(LIMIT_RGBA),
                |sample| sample.north,
                |limit| limit.north,
            ),
            (
                "central",
                5.0,
                Material::glow(CENTRAL_RGBA, CENTRAL_GLOW_POWER),
                |sample| sample.central,
                |limit| limit.central,
            ),
            (
                "south",
                1.0,
                Material::solid(LIMIT_RGBA),
                |sample| sample.south,
                |limit| limit.south,
            ),
        ];
        for (suffix, width, material, sample_pick, limit_pick) in polylines {
            packets.push(Packet {
                id: format!("{}_{}_polyline", iso, suffix),
                polyline: Some(Polyline {
                    show: true,
                    width,
                    follow_surface: true,
                    material,
                    positions: Positions {
                        cartographic_degrees: self.vertex_run(sample_pick, limit_pick),
                    },
                }),
                ..Default::default()
            });
        }

        let epoch_0 = epochs[first];
        let mut cartographic = Vec::with_capacity(4 * resolved.len());
        let mut semi_major = Vec::with_capacity(2 * resolved.len());
        let mut semi_minor = Vec::with_capacity(2 * resolved.len());
        let mut rotation = Vec::with_capacity(2 * resolved.len());
        for ((epoch, sample), frame) in epochs.iter().zip(&resolved).zip(&frames) {
            let offset = (*epoch - epoch_0).to_seconds();
            cartographic.extend([offset, sample.central.lon, sample.central.lat, 0.0]);
            semi_major.extend([offset, frame.semi_major_m]);
            semi_minor.extend([offset, frame.semi_minor_m]);
            rotation.extend([offset, frame.rotation_rad]);
        }
        packets.push(Packet {
            id: format!("{}_shadow_ellipse", iso),
            position: Some(SampledPosition {
                epoch: document_epoch.clone(),
                cartographic_degrees: cartographic,
            }),
            ellipse: Some(Ellipse {
                semi_major_axis: Series {
                    epoch: document_epoch.clone(),
                    number: semi_major,
                },
                semi_minor_axis: Series {
                    epoch: document_epoch.clone(),
                    number: semi_minor,
                },
                rotation: Series {
                    epoch: document_epoch,
                    number: rotation,
                },
                material: Material::solid(SHADOW_RGBA),
                fill: true,
                show: true,
                granularity: ELLIPSE_GRANULARITY,
            }),
            ..Default::default()
        });

        Ok(Document { packets })
    }

    /// Limit-to-limit vertex run of one waypoint as flat
    /// [lon, lat, 0.0, ..] degrees; absent points are skipped.
    fn vertex_run(
        &self,
        sample_pick: fn(&Sample) -> Option<Position>,
        limit_pick: fn(&LimitRecord) -> Option<Position>,
    ) -> Vec<f64> {
        let points = self
            .start_limit()
            .and_then(limit_pick)
            .into_iter()
            .chain(self.samples().iter().filter_map(sample_pick))
            .chain(self.end_limit().and_then(limit_pick));
        let mut degrees = Vec::new();
        for point in points {
            degrees.extend([point.lon, point.lat, 0.0]);
        }
        degrees
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn material_serialization() {
        let solid = serde_json::to_value(Material::solid([255, 255, 255, 128])).unwrap();
        assert_eq!(
            solid,
            json!({"solidColor": {"color": {"rgba": [255, 255, 255, 128]}}})
        );

        let glow = serde_json::to_value(Material::glow([223, 150, 47, 128], 0.25)).unwrap();
        assert_eq!(
            glow,
            json!({"polylineGlow": {"color": {"rgba": [223, 150, 47, 128]}, "glowPower": 0.25}})
        );
    }

    #[test]
    fn packet_member_casing() {
        let packet = Packet {
            id: "id".to_string(),
            clock: Some(Clock {
                multiplier: 300,
                range: "LOOP_STOP",
                step: "SYSTEM_CLOCK_MULTIPLIER",
                current_time: "2017-08-21T16:50:00Z".to_string(),
                interval: "2017-08-21T16:50:00Z/2017-08-21T20:00:00Z".to_string(),
            }),
            ..Default::default()
        };
        let value = serde_json::to_value(&packet).unwrap();
        assert_eq!(value["clock"]["currentTime"], "2017-08-21T16:50:00Z");
        assert_eq!(value["clock"]["multiplier"], 300);
        assert!(
            value.get("polyline").is_none(),
            "unset members must not serialize"
        );
    }
}
