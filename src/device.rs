use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Viewport widths (px) at which the layout switches class.
const TABLET_MIN_WIDTH: u32 = 768;
const PC_MIN_WIDTH: u32 = 1280;

/// Rough pixel width of one terminal column
const CELL_WIDTH_PX: u32 = 8;

/// Coarse viewport category controlling conveyor geometry
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Pc,
}

/// Distances along the conveyor for one device class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Where the cue has to be when the sign is made
    pub perfect_zone_distance: f64,
    /// Position past which the sign may be evaluated
    pub evaluation_threshold: f64,
    /// Widest distance from the perfect zone still rated OK
    pub ok_threshold: f64,
}

impl DeviceClass {
    pub fn from_viewport_width(width: u32) -> Self {
        if width < TABLET_MIN_WIDTH {
            DeviceClass::Mobile
        } else if width < PC_MIN_WIDTH {
            DeviceClass::Tablet
        } else {
            DeviceClass::Pc
        }
    }

    /// Class for a terminal `columns` cells wide
    pub fn from_terminal_columns(columns: u16) -> Self {
        Self::from_viewport_width(u32::from(columns) * CELL_WIDTH_PX)
    }

    pub fn geometry(&self) -> Geometry {
        match self {
            DeviceClass::Pc => Geometry {
                perfect_zone_distance: 600.0,
                evaluation_threshold: 200.0,
                ok_threshold: 127.0,
            },
            DeviceClass::Tablet => Geometry {
                perfect_zone_distance: 400.0,
                evaluation_threshold: 100.0,
                ok_threshold: 127.0,
            },
            DeviceClass::Mobile => Geometry {
                perfect_zone_distance: 200.0,
                evaluation_threshold: 20.0,
                ok_threshold: 95.0,
            },
        }
    }

    pub fn perfect_zone_distance(&self) -> f64 {
        self.geometry().perfect_zone_distance
    }
}
