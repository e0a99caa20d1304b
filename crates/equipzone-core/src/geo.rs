//! Location codec (RFC 1876)
//!
//! Converts between floating-point degrees/metres and the fixed-point
//! values carried by LOC records.
//!
//! Latitude and longitude are unsigned 32-bit milliarcsecond counts centred
//! on 2^31 (the equator and prime meridian); altitude is centimetres above a
//! base 100 000 m below the reference spheroid. Size and precision fields pack
//! a centimetre value into one byte as `(mantissa << 4) | exponent`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoded latitude of the equator (RFC 1876, Section 2)
pub const LOC_EQUATOR: u32 = 1 << 31;

/// Encoded longitude of the prime meridian (RFC 1876, Section 2)
pub const LOC_PRIMEMERIDIAN: u32 = 1 << 31;

/// Milliarcseconds per arc minute
pub const LOC_MINUTES: u32 = 60 * 1000;

/// Milliarcseconds per degree
pub const LOC_DEGREES: f64 = 60.0 * 60.0 * 1000.0;

/// Altitude base offset in metres
pub const LOC_ALTITUDEBASE: f64 = 100_000.0;

/// Default diameter of the enclosing sphere, in centimetres
pub const DEFAULT_SIZE_CM: u32 = 10_000;

/// Default horizontal precision, in centimetres
pub const DEFAULT_HORIZ_PRE_CM: u32 = 5_000;

/// Default vertical precision, in centimetres
pub const DEFAULT_VERT_PRE_CM: u32 = 5_000;

/// A decoded geographic position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Degrees north (negative for south)
    pub latitude: f64,
    /// Degrees east (negative for west)
    pub longitude: f64,
    /// Metres above the reference spheroid
    pub height: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, height: f64) -> Self {
        Self {
            latitude,
            longitude,
            height,
        }
    }
}

/// Decode fixed-point LOC values into a position
pub fn decode(lat: u32, lon: u32, alt: u32) -> Position {
    let latitude = if lat > LOC_EQUATOR {
        f64::from(lat - LOC_EQUATOR) / LOC_DEGREES
    } else {
        -f64::from(LOC_EQUATOR - lat) / LOC_DEGREES
    };

    let longitude = if lon > LOC_PRIMEMERIDIAN {
        f64::from(lon - LOC_PRIMEMERIDIAN) / LOC_DEGREES
    } else {
        -f64::from(LOC_PRIMEMERIDIAN - lon) / LOC_DEGREES
    };

    let height = f64::from(alt) / 100.0 - LOC_ALTITUDEBASE;

    Position {
        latitude,
        longitude,
        height,
    }
}

/// Encode a position into fixed-point LOC values `(lat, lon, alt)`
///
/// Out-of-range inputs saturate at the bounds of the wire format.
pub fn encode(position: Position) -> (u32, u32, u32) {
    let lat = (position.latitude * LOC_DEGREES).round() + f64::from(LOC_EQUATOR);
    let lon = (position.longitude * LOC_DEGREES).round() + f64::from(LOC_PRIMEMERIDIAN);
    let alt = ((position.height + LOC_ALTITUDEBASE) * 100.0).round();

    (lat as u32, lon as u32, alt as u32)
}

/// Pack a centimetre value into a size/precision byte
pub fn cm_to_size(cms: u32) -> u8 {
    let mut mantissa = cms;
    let mut exponent = 0u32;
    while mantissa >= 10 {
        mantissa /= 10;
        exponent += 1;
    }

    ((mantissa as u8) << 4) | (exponent as u8 & 0x0f)
}

/// Unpack a size/precision byte into centimetres
pub fn size_to_cm(size: u8) -> u64 {
    let mantissa = u64::from(size >> 4);
    let exponent = u32::from(size & 0x0f);
    mantissa * 10u64.saturating_pow(exponent)
}

/// LOC record data (RFC 1876)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Loc {
    pub version: u8,
    pub size: u8,
    pub horiz_pre: u8,
    pub vert_pre: u8,
    pub latitude: u32,
    pub longitude: u32,
    pub altitude: u32,
}

impl Loc {
    /// Build LOC data for a position using the default size and precisions
    pub fn from_position(position: Position) -> Self {
        let (latitude, longitude, altitude) = encode(position);
        Self {
            version: 0,
            size: cm_to_size(DEFAULT_SIZE_CM),
            horiz_pre: cm_to_size(DEFAULT_HORIZ_PRE_CM),
            vert_pre: cm_to_size(DEFAULT_VERT_PRE_CM),
            latitude,
            longitude,
            altitude,
        }
    }

    pub fn position(&self) -> Position {
        decode(self.latitude, self.longitude, self.altitude)
    }
}

fn write_angle(f: &mut fmt::Formatter<'_>, value: u32, centre: u32, pos: char, neg: char) -> fmt::Result {
    let (mut mas, hemisphere) = if value > centre {
        (value - centre, pos)
    } else {
        (centre - value, neg)
    };
    let degrees = mas / (LOC_DEGREES as u32);
    mas %= LOC_DEGREES as u32;
    let minutes = mas / LOC_MINUTES;
    mas %= LOC_MINUTES;

    write!(
        f,
        "{:02} {:02} {:.3} {} ",
        degrees,
        minutes,
        f64::from(mas) / 1000.0,
        hemisphere
    )
}

fn write_metres(f: &mut fmt::Formatter<'_>, size: u8) -> fmt::Result {
    let mantissa = size >> 4;
    let exponent = size & 0x0f;
    if exponent < 2 {
        let cm = if exponent == 1 { mantissa * 10 } else { mantissa };
        return write!(f, "0.{:02}m", cm);
    }
    write!(f, "{}", mantissa)?;
    for _ in 2..exponent {
        f.write_str("0")?;
    }
    f.write_str("m")
}

/// Master-file presentation, e.g. `41 17 25.580 S 174 46 53.746 E 21m 100m 50m 50m`
impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_angle(f, self.latitude, LOC_EQUATOR, 'N', 'S')?;
        write_angle(f, self.longitude, LOC_PRIMEMERIDIAN, 'E', 'W')?;

        let altitude = f64::from(self.altitude) / 100.0 - LOC_ALTITUDEBASE;
        if self.altitude % 100 != 0 {
            write!(f, "{:.2}m ", altitude)?;
        } else {
            write!(f, "{:.0}m ", altitude)?;
        }

        write_metres(f, self.size)?;
        f.write_str(" ")?;
        write_metres(f, self.horiz_pre)?;
        f.write_str(" ")?;
        write_metres(f, self.vert_pre)
    }
}
