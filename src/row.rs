//! Table row tokenization, placeholder repair and column mapping
use crate::coords::decode_latlon;
use crate::track::Position;

/// Literal marker found in the time column of boundary rows.
pub(crate) const LIMITS_MARKER: &str = "Limits";

/// Stands in for one token of an expanded waypoint placeholder.
const MISSING: &str = "?";

/// Waypoint coordinate pairs occupy token positions [0, 6):
/// lone hyphens are only expanded inside that range.
const WAYPOINT_TOKENS: usize = 6;

/// Splits one raw table line on runs of whitespace.
pub(crate) fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(ToOwned::to_owned).collect()
}

/// Expands lone hyphen placeholders in the waypoint token range.
///
/// The upstream table sometimes emits a single `-` where a (value,
/// cardinal) token pair is structurally expected. Left alone, every
/// column after it would shift left by one and corrupt the rest of the
/// row. Each such hyphen becomes two `?` tokens, so the fixed column
/// offsets keep lining up. Hyphens past the waypoint range (e.g. a
/// missing sun azimuth) are legitimate single scalars and stay put.
/// Idempotent: a repaired row no longer holds in-range hyphens.
pub(crate) fn repair_placeholders(mut tokens: Vec<String>) -> Vec<String> {
    while let Some(index) = tokens
        .iter()
        .take(WAYPOINT_TOKENS)
        .position(|token| token == "-")
    {
        tokens[index] = MISSING.to_string();
        tokens.insert(index + 1, MISSING.to_string());
    }
    tokens
}

/// Parses a `HH:MM` time-of-day token.
pub(crate) fn time_of_day(token: &str) -> Option<(u8, u8)> {
    let (hours, minutes) = token.split_once(':')?;
    let hours = hours.parse::<u8>().ok()?;
    let minutes = minutes.parse::<u8>().ok()?;
    (hours < 24 && minutes < 60).then_some((hours, minutes))
}

/// True for tokens a sample row must lead with.
pub(crate) fn is_time_token(token: &str) -> bool {
    time_of_day(token).is_some()
}

/// Logical columns of the upstream table, in schema order.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Time,
    NorthLat,
    NorthLon,
    SouthLat,
    SouthLon,
    CentralLat,
    CentralLon,
    MagnitudeRatio,
    SunAltitude,
    SunAzimuth,
    PathWidth,
    CentralLineDuration,
}

/// Decoded value of one column.
enum Value {
    Text(Option<String>),
    Number(Option<f64>),
}

type Decoder = fn(&[String], usize) -> Value;

/// Fixed column schema: (column, leading token index, decoder).
/// Coordinate columns consume two tokens (degrees, minutes+cardinal);
/// all offsets assume a repaired token row.
const SCHEMA: [(Column, usize, Decoder); 12] = [
    (Column::Time, 0, text),
    (Column::NorthLat, 1, angle),
    (Column::NorthLon, 3, angle),
    (Column::SouthLat, 5, angle),
    (Column::SouthLon, 7, angle),
    (Column::CentralLat, 9, angle),
    (Column::CentralLon, 11, angle),
    (Column::MagnitudeRatio, 13, number),
    (Column::SunAltitude, 14, number),
    (Column::SunAzimuth, 15, number),
    (Column::PathWidth, 16, number),
    (Column::CentralLineDuration, 17, text),
];

fn text(tokens: &[String], index: usize) -> Value {
    Value::Text(tokens.get(index).cloned())
}

fn number(tokens: &[String], index: usize) -> Value {
    Value::Number(tokens.get(index).and_then(|token| token.parse().ok()))
}

fn angle(tokens: &[String], index: usize) -> Value {
    Value::Number(match (tokens.get(index), tokens.get(index + 1)) {
        (Some(deg), Some(min_card)) => decode_latlon(deg, min_card),
        _ => None,
    })
}

/// Named fields of one mapped row; every field degrades to absent
/// on parse failure.
#[derive(Debug, Default)]
pub(crate) struct RowFields {
    pub(crate) time: Option<String>,
    pub(crate) north: Option<Position>,
    pub(crate) south: Option<Position>,
    pub(crate) central: Option<Position>,
    pub(crate) magnitude_ratio: Option<f64>,
    pub(crate) sun_altitude: Option<f64>,
    pub(crate) sun_azimuth: Option<f64>,
    pub(crate) path_width: Option<f64>,
    pub(crate) central_line_duration: Option<String>,
}

fn position(lon: Option<f64>, lat: Option<f64>) -> Option<Position> {
    Some(Position {
        lon: lon?,
        lat: lat?,
    })
}

/// Maps a repaired token row onto named fields through [SCHEMA].
pub(crate) fn map_fields(tokens: &[String]) -> RowFields {
    let mut fields = RowFields::default();
    let (mut north_lat, mut north_lon) = (None, None);
    let (mut south_lat, mut south_lon) = (None, None);
    let (mut central_lat, mut central_lon) = (None, None);

    for (column, index, decode) in SCHEMA {
        match (column, decode(tokens, index)) {
            (Column::Time, Value::Text(value)) => fields.time = value,
            (Column::NorthLat, Value::Number(value)) => north_lat = value,
            (Column::NorthLon, Value::Number(value)) => north_lon = value,
            (Column::SouthLat, Value::Number(value)) => south_lat = value,
            (Column::SouthLon, Value::Number(value)) => south_lon = value,
            (Column::CentralLat, Value::Number(value)) => central_lat = value,
            (Column::CentralLon, Value::Number(value)) => central_lon = value,
            (Column::MagnitudeRatio, Value::Number(value)) => fields.magnitude_ratio = value,
            (Column::SunAltitude, Value::Number(value)) => fields.sun_altitude = value,
            (Column::SunAzimuth, Value::Number(value)) => fields.sun_azimuth = value,
            (Column::PathWidth, Value::Number(value)) => fields.path_width = value,
            (Column::CentralLineDuration, Value::Text(value)) => {
                fields.central_line_duration = value
            },
            _ => {},
        }
    }

    fields.north = position(north_lon, north_lat);
    fields.south = position(south_lon, south_lat);
    fields.central = position(central_lon, central_lat);
    fields
}
