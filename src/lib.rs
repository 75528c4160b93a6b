#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod coords;
mod geometry;
mod row;

mod czml;
mod track;

// pub export
pub use czml::Error;


// prelude
pub mod prelude {
    pub use crate::czml::{Document, Metadata, Packet};
    pub use crate::geometry::{EllipseFrame, Error as GeometryError, Waypoint};
    pub use crate::track::{EclipseType, EventDate, LimitRecord, Position, Sample, Track};
    // re-export
    pub use crate::czml::Error;
    pub use hifitime::{Duration, Epoch};
}
