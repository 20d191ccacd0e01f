use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Axis, CoordinateError};

/// Latitude cells per longitude column in the feed's raster (-90..=90).
pub const LATITUDE_CELLS: usize = 181;

/// Whole-degree location. Only constructed through validation, so both
/// components are always within range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate {
    lat: i32,
    lng: i32,
}

impl Coordinate {
    pub fn new(lat: i64, lng: i64) -> Result<Coordinate, CoordinateError> {
        Ok(Coordinate {
            lat: check_range(Axis::Latitude, lat)?,
            lng: check_range(Axis::Longitude, lng)?,
        })
    }

    /// Parses a pair of tokens such as `58N 40W` or `-58 -40`.
    pub fn parse(lat: &str, lng: &str) -> Result<Coordinate, CoordinateError> {
        let lat = parse_token(Axis::Latitude, lat)?;
        let lng = parse_token(Axis::Longitude, lng)?;
        Coordinate::new(lat, lng)
    }

    pub fn lat(&self) -> i32 {
        self.lat
    }

    pub fn lng(&self) -> i32 {
        self.lng
    }

    pub fn to_cardinal(&self, convention: LongitudeConvention) -> (String, String) {
        let lat = if self.lat >= 0 {
            format!("{}N", self.lat)
        } else {
            format!("{}S", -self.lat)
        };
        let (pos, neg) = match convention {
            LongitudeConvention::Feed => ('W', 'E'),
            LongitudeConvention::Standard => ('E', 'W'),
        };
        let lng = if self.lng >= 0 {
            format!("{}{}", self.lng, pos)
        } else {
            format!("{}{}", -self.lng, neg)
        };
        (lat, lng)
    }

    /// Position of this coordinate in the feed's raster ordering, which is
    /// longitude-major with 181 latitude cells per column.
    pub fn grid_index(&self) -> GridIndex {
        let lat_cell = (self.lat + 90) as usize;
        let lng_cell = if self.lng > 0 {
            self.lng as usize
        } else {
            (180 - self.lng) as usize
        };
        GridIndex(lng_cell * LATITUDE_CELLS + lat_cell)
    }

    /// This coordinate in the feed's own `[longitude, latitude]` cell space,
    /// where longitude runs 0..360 eastward.
    pub fn feed_position(&self) -> (f64, f64) {
        (self.lng.rem_euclid(360) as f64, self.lat as f64)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (lat, lng) = self.to_cardinal(LongitudeConvention::Feed);
        write!(f, "{} {}", lat, lng)
    }
}

/// How non-negative and negative longitudes are labelled when printed.
///
/// `Feed` labels non-negative longitudes `W` and negative ones `E`, which is
/// the reverse of the usual geographic convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LongitudeConvention {
    #[default]
    Feed,
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridIndex(usize);

impl GridIndex {
    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(-)?(\d+)(.)?").expect("token pattern compiles"))
}

fn parse_token(axis: Axis, token: &str) -> Result<i64, CoordinateError> {
    let malformed = || CoordinateError::Malformed {
        axis,
        token: token.to_string(),
    };

    let caps = token_pattern().captures(token).ok_or_else(malformed)?;
    let negative = caps.get(1).is_some();
    let magnitude = caps[2].parse::<i64>().map_err(|_| malformed())?;

    let direction = match caps.get(3) {
        None if negative => return Ok(-magnitude),
        None => return Ok(magnitude),
        // A sign and a direction letter together are ambiguous.
        Some(_) if negative => return Err(malformed()),
        Some(m) => m.as_str().to_ascii_uppercase(),
    };

    match (axis, direction.as_str()) {
        (Axis::Latitude, "N") | (Axis::Longitude, "E") => Ok(magnitude),
        (Axis::Latitude, "S") | (Axis::Longitude, "W") => Ok(-magnitude),
        _ => Err(malformed()),
    }
}

fn check_range(axis: Axis, value: i64) -> Result<i32, CoordinateError> {
    let limit = axis.limit();
    if value.abs() > limit as i64 {
        return Err(CoordinateError::OutOfRange { axis, value, limit });
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: &str, lng: &str) -> Coordinate {
        Coordinate::parse(lat, lng).unwrap()
    }

    #[test]
    fn parses_cardinal_tokens() {
        let c = coord("58S", "40w");
        assert_eq!(c.lat(), -58);
        assert_eq!(c.lng(), -40);

        let c = coord("64n", "147E");
        assert_eq!(c.lat(), 64);
        assert_eq!(c.lng(), 147);
    }

    #[test]
    fn parses_signed_decimal_tokens() {
        let c = coord("-58", "-40");
        assert_eq!((c.lat(), c.lng()), (-58, -40));

        let c = coord("0", "180");
        assert_eq!((c.lat(), c.lng()), (0, 180));
    }

    #[test]
    fn ignores_text_after_direction() {
        let c = coord("58North", "40West");
        assert_eq!((c.lat(), c.lng()), (58, -40));
    }

    #[test]
    fn rejects_wrong_direction_letters() {
        for (lat, lng) in [("58E", "40W"), ("58N", "40N"), ("58X", "0"), ("58 ", "0")] {
            assert!(
                matches!(
                    Coordinate::parse(lat, lng),
                    Err(CoordinateError::Malformed { .. })
                ),
                "{} {}",
                lat,
                lng
            );
        }
    }

    #[test]
    fn rejects_tokens_without_digits() {
        for token in ["", "N", "-", "-S", "abc"] {
            match Coordinate::parse(token, "0") {
                Err(CoordinateError::Malformed { axis, token: t }) => {
                    assert_eq!(axis, Axis::Latitude);
                    assert_eq!(t, token);
                }
                other => panic!("{:?} parsed as {:?}", token, other),
            }
        }
    }

    #[test]
    fn rejects_sign_with_direction() {
        assert!(matches!(
            Coordinate::parse("0", "-40W"),
            Err(CoordinateError::Malformed {
                axis: Axis::Longitude,
                ..
            })
        ));
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            Coordinate::parse("91N", "0"),
            Err(CoordinateError::OutOfRange {
                axis: Axis::Latitude,
                value: 91,
                limit: 90
            })
        ));
        assert!(matches!(
            Coordinate::parse("-91", "0"),
            Err(CoordinateError::OutOfRange { .. })
        ));
        assert!(matches!(
            Coordinate::parse("0", "-200"),
            Err(CoordinateError::OutOfRange {
                axis: Axis::Longitude,
                value: -200,
                limit: 180
            })
        ));
        assert!(matches!(
            Coordinate::parse("0", "181E"),
            Err(CoordinateError::OutOfRange { .. })
        ));
        assert!(Coordinate::parse("90S", "180W").is_ok());
    }

    #[test]
    fn huge_magnitudes_are_malformed() {
        assert!(matches!(
            Coordinate::parse("99999999999999999999999", "0"),
            Err(CoordinateError::Malformed { .. })
        ));
    }

    #[test]
    fn cardinal_round_trip() {
        let c = coord("58S", "0");
        assert_eq!(c.to_cardinal(LongitudeConvention::Feed).0, "58S");

        for lat in -90..=90 {
            for lng in (-180..=180).step_by(7) {
                let c = Coordinate::new(lat, lng).unwrap();
                let (lat_s, lng_s) = c.to_cardinal(LongitudeConvention::Standard);
                assert_eq!(coord(&lat_s, &lng_s), c);
            }
        }
    }

    #[test]
    fn feed_convention_inverts_longitude_suffix() {
        let c = coord("10N", "40W");
        assert_eq!(
            c.to_cardinal(LongitudeConvention::Feed),
            ("10N".to_string(), "40E".to_string())
        );
        assert_eq!(
            c.to_cardinal(LongitudeConvention::Standard),
            ("10N".to_string(), "40W".to_string())
        );
        assert_eq!(coord("0", "0").to_string(), "0N 0W");
    }

    #[test]
    fn grid_index_matches_feed_raster() {
        assert_eq!(coord("0", "0").grid_index().get(), 32670);
        assert_eq!(coord("-90", "-180").grid_index().get(), 65160);
        assert_eq!(coord("90", "180").grid_index().get(), 32760);
        assert_eq!(coord("-90", "1").grid_index().get(), 181);
        assert_eq!(coord("65N", "148E").grid_index().get(), 148 * 181 + 155);
    }

    #[test]
    fn feed_position_wraps_longitude() {
        assert_eq!(coord("65", "148").feed_position(), (148.0, 65.0));
        assert_eq!(coord("-10", "-40").feed_position(), (320.0, -10.0));
        assert_eq!(coord("0", "-180").feed_position(), (180.0, 0.0));
    }
}
