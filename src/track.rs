//! Eclipse track model: typed samples, limit records, accumulation
use hifitime::Epoch;
use log::{debug, warn};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::row::{self, RowFields};

/// Ground point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    /// Longitude [°], positive East
    pub lon: f64,
    /// Latitude [°], positive North
    pub lat: f64,
}

/// One time-sampled eclipse track observation. Any waypoint or scalar
/// may individually be absent: the path can run off the globe's edge
/// for one waypoint while the others remain defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Universal time of day, as printed in the table ("HH:MM")
    pub time: String,
    /// Northern limit waypoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub north: Option<Position>,
    /// Central line waypoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub central: Option<Position>,
    /// Southern limit waypoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub south: Option<Position>,
    /// Moon/Sun diameter ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude_ratio: Option<f64>,
    /// Sun altitude [°]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_altitude: Option<f64>,
    /// Sun azimuth [°]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_azimuth: Option<f64>,
    /// Path width [km]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_width: Option<f64>,
    /// Central line duration literal (e.g. "01m01.6s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub central_line_duration: Option<String>,
}

impl Sample {
    /// Builds a Sample from mapped row fields. Rows without a time
    /// value are never recorded.
    pub(crate) fn from_row(fields: RowFields) -> Option<Self> {
        Some(Self {
            time: fields.time?,
            north: fields.north,
            central: fields.central,
            south: fields.south,
            magnitude_ratio: fields.magnitude_ratio,
            sun_altitude: fields.sun_altitude,
            sun_azimuth: fields.sun_azimuth,
            path_width: fields.path_width,
            central_line_duration: fields.central_line_duration,
        })
    }
}

/// Boundary record marking one edge of the visible eclipse path.
/// Structurally a [Sample] without a time of day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub north: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub central: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub south: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_azimuth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub central_line_duration: Option<String>,
}

impl LimitRecord {
    pub(crate) fn from_row(fields: RowFields) -> Self {
        Self {
            north: fields.north,
            central: fields.central,
            south: fields.south,
            magnitude_ratio: fields.magnitude_ratio,
            sun_altitude: fields.sun_altitude,
            sun_azimuth: fields.sun_azimuth,
            path_width: fields.path_width,
            central_line_duration: fields.central_line_duration,
        }
    }
}

/// Calendar date of the eclipse event (UTC).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl EventDate {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }
    /// "YYYY-MM-DD"
    pub fn iso(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
    /// UTC Epoch at given time of day on this date.
    pub(crate) fn epoch_at(&self, hours: u8, minutes: u8) -> Epoch {
        Epoch::from_gregorian_utc(self.year, self.month, self.day, hours, minutes, 0, 0)
    }
    /// ISO8601 timestamp at given time of day on this date.
    pub(crate) fn iso_at(&self, hours: u8, minutes: u8) -> String {
        format!("{}T{:02}:{:02}:00Z", self.iso(), hours, minutes)
    }
}

impl std::fmt::Display for EventDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iso())
    }
}

/// Eclipse flavour, as encoded in the upstream path-page URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EclipseType {
    Total,
    Annular,
    Hybrid,
    #[default]
    Unknown,
}

impl EclipseType {
    /// Infers the type from the trailing letter of the upstream
    /// `..{T|A|H}path.html` URL.
    pub fn from_url(url: &str) -> Self {
        match url.strip_suffix("path.html").and_then(|s| s.chars().last()) {
            Some('T') => Self::Total,
            Some('A') => Self::Annular,
            Some('H') => Self::Hybrid,
            _ => Self::Unknown,
        }
    }
}

/// Ordered eclipse ground track for one calendar date.
///
/// Created empty, populated once by [Track::feed], read-only afterwards
/// except for derived accessors (CZML document, camera position,
/// metadata).
#[derive(Debug, Clone)]
pub struct Track {
    /// Event calendar date
    pub date: EventDate,
    /// Source page URL, when known
    pub url: Option<String>,
    /// Eclipse flavour
    pub eclipse_type: EclipseType,
    pub(crate) samples: Vec<Sample>,
    pub(crate) start_limit: Option<LimitRecord>,
    pub(crate) end_limit: Option<LimitRecord>,
}

impl Track {
    /// Builds an empty track for given event date.
    pub fn new(date: EventDate) -> Self {
        Self {
            date,
            url: None,
            eclipse_type: EclipseType::default(),
            samples: Vec::new(),
            start_limit: None,
            end_limit: None,
        }
    }

    /// Attaches the source page URL and infers the eclipse type from it.
    pub fn with_url(mut self, url: &str) -> Self {
        self.eclipse_type = EclipseType::from_url(url);
        self.url = Some(url.to_string());
        self
    }

    /// One-shot constructor: new track populated from raw table text.
    pub fn from_table(date: EventDate, table: &str) -> Self {
        let mut track = Self::new(date);
        track.feed(table);
        track
    }

    /// Populates the track from the raw preformatted table text.
    ///
    /// Rows ahead of the first `Limits` marker are header material,
    /// rows past the second are trailer material: both are skipped
    /// without field extraction. The first two marker rows become the
    /// start/end limit records; further ones are ignored. Rows between
    /// the markers need a valid leading time token to be recorded as a
    /// [Sample].
    pub fn feed(&mut self, table: &str) {
        let mut limits_seen = 0_usize;
        for line in table.lines() {
            let tokens = row::tokenize(line);
            let Some(first) = tokens.first() else {
                continue;
            };
            if first == row::LIMITS_MARKER {
                limits_seen += 1;
                if limits_seen > 2 {
                    warn!("{}: ignoring extra limits row", self.date);
                    continue;
                }
                let fields = row::map_fields(&row::repair_placeholders(tokens));
                let record = LimitRecord::from_row(fields);
                if limits_seen == 1 {
                    self.start_limit = Some(record);
                } else {
                    self.end_limit = Some(record);
                }
                continue;
            }
            if limits_seen != 1 {
                continue;
            }
            if !row::is_time_token(first) {
                debug!("{}: skipping row \"{}\"", self.date, first);
                continue;
            }
            let fields = row::map_fields(&row::repair_placeholders(tokens));
            if let Some(sample) = Sample::from_row(fields) {
                self.samples.push(sample);
            }
        }
        debug!(
            "{}: {} samples, limits ({}, {})",
            self.date,
            self.samples.len(),
            self.start_limit.is_some(),
            self.end_limit.is_some(),
        );
    }

    /// Recorded samples, in chronological table order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Start (first encountered) limit record.
    pub fn start_limit(&self) -> Option<&LimitRecord> {
        self.start_limit.as_ref()
    }

    /// End (second encountered) limit record.
    pub fn end_limit(&self) -> Option<&LimitRecord> {
        self.end_limit.as_ref()
    }

    /// Snapshot of all populated attributes; attributes that are wholly
    /// empty are omitted.
    pub fn data(&self) -> Value {
        let mut map = Map::new();
        map.insert("date".to_string(), json!(self.date.iso()));
        if self.eclipse_type != EclipseType::Unknown {
            map.insert("type".to_string(), json!(self.eclipse_type));
        }
        if let Some(url) = &self.url {
            map.insert("url".to_string(), json!(url));
        }
        if !self.samples.is_empty() {
            map.insert("samples".to_string(), json!(self.samples));
        }
        if let Some(start) = &self.start_limit {
            map.insert("startLimit".to_string(), json!(start));
        }
        if let Some(end) = &self.end_limit {
            map.insert("endLimit".to_string(), json!(end));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TABLE: &str = "\
M:S                 Central
Universal  Northern Limit      Southern Limit       Central Line     Diam.  Sun Sun Path   Line
         ------------------  ------------------  ------------------  Ratio  Alt Azm Width Durat.
  Time   Latitude Longitude  Latitude Longitude  Latitude Longitude

 Limits  39 59.7N 171 44.9W  39 28.8N 171 26.0W  39 44.2N 171 35.4W  1.016   0   -   62  00m51.6s
 16:50   41 29.7N 164 30.3W  41 25.2N 161 24.4W  41 29.2N 162 51.0W  1.018   7  80   70  01m01.6s
 20:00   13 39.6N 036 48.6W  13 28.6N 038 28.0W  13 34.6N 037 39.5W  1.017  11 280   71  01m02.5s
 Limits  11 15.6N 027 19.9W  10 46.9N 027 33.1W  11 01.2N 027 26.5W  1.014   0   -   57  00m47.1s";

    #[test]
    fn table_population() {
        let track = Track::from_table(EventDate::new(2017, 8, 21), TABLE);

        assert_eq!(track.samples().len(), 2, "two timed rows expected");
        assert!(track.start_limit().is_some());
        assert!(track.end_limit().is_some());

        let first = &track.samples()[0];
        assert_eq!(first.time, "16:50");
        assert_eq!(
            first.central,
            Some(Position {
                lon: -162.85,
                lat: 41.487
            })
        );
        assert_eq!(
            first.north,
            Some(Position {
                lon: -164.505,
                lat: 41.495
            })
        );

        let start = track.start_limit().unwrap();
        assert_eq!(
            start.central,
            Some(Position {
                lon: -171.59,
                lat: 39.737
            })
        );
        assert_eq!(start.sun_altitude, Some(0.0));
        assert!(start.sun_azimuth.is_none(), "hyphen scalar stays absent");
        assert_eq!(start.path_width, Some(62.0));

        let end = track.end_limit().unwrap();
        assert_eq!(end.path_width, Some(57.0));
    }

    #[test]
    fn third_limits_row_ignored() {
        let table = format!(
            "{}\n Limits  00 00.0N 000 00.0W  00 00.0N 000 00.0W  00 00.0N 000 00.0W  1.000   0   -   10  00m10.0s",
            TABLE
        );
        let track = Track::from_table(EventDate::new(2017, 8, 21), &table);
        assert_eq!(
            track.end_limit().unwrap().path_width,
            Some(57.0),
            "end limit must keep the second limits row"
        );
    }

    #[test]
    fn rows_after_end_marker_ignored() {
        let table = format!(
            "{}\n 21:00   13 39.6N 036 48.6W  13 28.6N 038 28.0W  13 34.6N 037 39.5W  1.017  11 280   71  01m02.5s",
            TABLE
        );
        let track = Track::from_table(EventDate::new(2017, 8, 21), &table);
        assert_eq!(
            track.samples().len(),
            2,
            "timed rows past the end marker are trailer material"
        );
    }

    #[test]
    fn preamble_rows_never_become_samples() {
        let table = "\
  Time   Latitude Longitude
 16:40   41 29.7N 164 30.3W  41 25.2N 161 24.4W  41 29.2N 162 51.0W  1.018   7  80   70  01m01.6s
 Limits  39 59.7N 171 44.9W  39 28.8N 171 26.0W  39 44.2N 171 35.4W  1.016   0   -   62  00m51.6s
 16:50   41 29.7N 164 30.3W  41 25.2N 161 24.4W  41 29.2N 162 51.0W  1.018   7  80   70  01m01.6s";
        let track = Track::from_table(EventDate::new(2017, 8, 21), table);
        assert_eq!(track.samples().len(), 1, "rows before first marker skip");
        assert_eq!(track.samples()[0].time, "16:50");
    }

    #[test]
    fn data_omits_empty_attributes() {
        let date = EventDate::new(2017, 8, 21);
        let empty = Track::new(date);
        let data = empty.data();
        assert_eq!(data["date"], "2017-08-21");
        assert!(data.get("samples").is_none());
        assert!(data.get("startLimit").is_none());
        assert!(data.get("endLimit").is_none());
        assert!(data.get("url").is_none());
        assert!(data.get("type").is_none());

        let track = Track::from_table(date, TABLE)
            .with_url("https://eclipse.gsfc.nasa.gov/SEpath/SEpath2001/SE2017Aug21Tpath.html");
        let data = track.data();
        assert_eq!(data["type"], "total");
        assert_eq!(data["samples"].as_array().unwrap().len(), 2);
        assert_eq!(data["samples"][0]["time"], "16:50");
        assert_eq!(data["samples"][0]["central"]["lon"], -162.85);
        assert!(
            data["startLimit"].get("sunAzimuth").is_none(),
            "absent fields must not serialize"
        );
    }

    #[test]
    fn eclipse_type_from_url() {
        for (url, expected) in [
            (
                "https://eclipse.gsfc.nasa.gov/SEpath/SEpath2001/SE2017Aug21Tpath.html",
                EclipseType::Total,
            ),
            (
                "https://eclipse.gsfc.nasa.gov/SEpath/SEpath2001/SE2023Oct14Apath.html",
                EclipseType::Annular,
            ),
            (
                "https://eclipse.gsfc.nasa.gov/SEpath/SEpath2001/SE2013Nov03Hpath.html",
                EclipseType::Hybrid,
            ),
            ("https://example.com/whatever.html", EclipseType::Unknown),
        ] {
            assert_eq!(EclipseType::from_url(url), expected, "{}", url);
        }
    }
}
