//! Ephemeris payloads and the tagged request/reply wire types

use hifitime::Epoch;
use orrery_core::{EquatorialCoordinate, HorizontalCoordinate, Precision, Provenance};
use orrery_sim::Body;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instants cross the wire as readable UTC timestamps ("2024-06-21T00:00:00 UTC")
mod instant {
    use hifitime::Epoch;
    use orrery_core::config::parse_instant;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(epoch: &Epoch, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(epoch)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Epoch, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_instant(&text).map_err(D::Error::custom)
    }

    pub mod option {
        use hifitime::Epoch;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(epoch: &Option<Epoch>, serializer: S) -> Result<S::Ok, S::Error> {
            match epoch {
                Some(epoch) => super::serialize(epoch, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Epoch>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(with = "super")] Epoch);

            Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(epoch)| epoch))
        }
    }
}

/// Tropical zodiac sign, 30° of ecliptic longitude each starting at the equinox
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        Self::Aries,
        Self::Taurus,
        Self::Gemini,
        Self::Cancer,
        Self::Leo,
        Self::Virgo,
        Self::Libra,
        Self::Scorpio,
        Self::Sagittarius,
        Self::Capricorn,
        Self::Aquarius,
        Self::Pisces,
    ];

    /// Sign and degree within the sign for an ecliptic longitude
    pub fn from_longitude(longitude: f64) -> (Self, f64) {
        let lon = longitude.rem_euclid(360.0);
        let index = ((lon / 30.0) as usize).min(11);
        (Self::ALL[index], lon - index as f64 * 30.0)
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Geocentric position of a solar-system body
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetaryPosition {
    pub body: Body,
    /// J2000 equatorial position
    pub equatorial: EquatorialCoordinate,
    /// Observer's sky, when an observer was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<HorizontalCoordinate>,
    /// Ecliptic longitude of date (degrees, [0, 360))
    pub ecliptic_longitude: f64,
    pub ecliptic_latitude: f64,
    /// Distance from Earth (AU)
    pub distance_au: f64,
    pub angular_diameter_arcsec: f64,
    /// Illuminated fraction of the disk, 0..=1
    pub phase: f64,
    pub retrograde: bool,
    pub sign: ZodiacSign,
    /// Degree within the sign, [0, 30)
    pub degree: f64,
}

impl PlanetaryPosition {
    /// Angular distance along the ecliptic to another body, [0, 180]
    pub fn longitude_separation(&self, other: &PlanetaryPosition) -> f64 {
        let d = (self.ecliptic_longitude - other.ecliptic_longitude).rem_euclid(360.0);
        if d > 180.0 {
            360.0 - d
        } else {
            d
        }
    }
}

/// Classical aspect kinds and their angles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectKind {
    Conjunction,
    Semisextile,
    Semisquare,
    Sextile,
    Square,
    Trine,
    Sesquiquadrate,
    Quincunx,
    Opposition,
}

impl AspectKind {
    pub const ALL: [AspectKind; 9] = [
        Self::Conjunction,
        Self::Semisextile,
        Self::Semisquare,
        Self::Sextile,
        Self::Square,
        Self::Trine,
        Self::Sesquiquadrate,
        Self::Quincunx,
        Self::Opposition,
    ];

    pub fn angle(&self) -> f64 {
        match self {
            Self::Conjunction => 0.0,
            Self::Semisextile => 30.0,
            Self::Semisquare => 45.0,
            Self::Sextile => 60.0,
            Self::Square => 90.0,
            Self::Trine => 120.0,
            Self::Sesquiquadrate => 135.0,
            Self::Quincunx => 150.0,
            Self::Opposition => 180.0,
        }
    }
}

/// A pair of bodies in aspect
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectRecord {
    pub body1: Body,
    pub body2: Body,
    pub kind: AspectKind,
    /// Exact angle of the aspect kind
    pub angle: f64,
    /// Measured separation
    pub separation: f64,
    /// |separation - angle|
    pub orb: f64,
    pub exact: bool,
    pub applying: bool,
}

impl AspectRecord {
    pub fn separating(&self) -> bool {
        !self.applying
    }
}

/// One retrograde loop of a body
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrogradePeriod {
    pub body: Body,
    /// Station retrograde; `None` when the window opens mid-loop
    #[serde(default, with = "instant::option")]
    pub station_retrograde: Option<Epoch>,
    /// Station direct; `None` when the window closes mid-loop
    #[serde(default, with = "instant::option")]
    pub station_direct: Option<Epoch>,
    #[serde(default, with = "instant::option")]
    pub pre_shadow: Option<Epoch>,
    #[serde(default, with = "instant::option")]
    pub post_shadow: Option<Epoch>,
    /// Fastest backward motion seen in the loop (degrees/day, negative)
    pub peak_speed: f64,
}

/// Eight-way lunar phase name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoonPhaseName {
    #[serde(rename = "New Moon")]
    NewMoon,
    #[serde(rename = "Waxing Crescent")]
    WaxingCrescent,
    #[serde(rename = "First Quarter")]
    FirstQuarter,
    #[serde(rename = "Waxing Gibbous")]
    WaxingGibbous,
    #[serde(rename = "Full Moon")]
    FullMoon,
    #[serde(rename = "Waning Gibbous")]
    WaningGibbous,
    #[serde(rename = "Last Quarter")]
    LastQuarter,
    #[serde(rename = "Waning Crescent")]
    WaningCrescent,
}

impl MoonPhaseName {
    pub const ALL: [MoonPhaseName; 8] = [
        Self::NewMoon,
        Self::WaxingCrescent,
        Self::FirstQuarter,
        Self::WaxingGibbous,
        Self::FullMoon,
        Self::WaningGibbous,
        Self::LastQuarter,
        Self::WaningCrescent,
    ];

    /// Phase for a Sun-Moon elongation; 45° bins centered on the principal phases
    pub fn from_elongation(elongation: f64) -> Self {
        let e = (elongation + 22.5).rem_euclid(360.0);
        Self::ALL[((e / 45.0) as usize).min(7)]
    }

    /// Elongation at the center of this phase's bin
    pub fn elongation(&self) -> f64 {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0) as f64 * 45.0
    }

    pub fn next(&self) -> Self {
        let i = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(i + 1) % 8]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewMoon => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent",
            Self::FirstQuarter => "First Quarter",
            Self::WaxingGibbous => "Waxing Gibbous",
            Self::FullMoon => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous",
            Self::LastQuarter => "Last Quarter",
            Self::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for MoonPhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lunar phase at an instant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonPhase {
    pub name: MoonPhaseName,
    /// Sun-Moon elongation in ecliptic longitude, [0, 360)
    pub elongation: f64,
    /// Illuminated fraction, 0..=1
    pub illumination: f64,
    /// Days since new moon
    pub age_days: f64,
    pub distance_km: f64,
    pub angular_diameter_arcsec: f64,
    pub next_phase: MoonPhaseName,
    /// Estimated from the mean synodic rate
    #[serde(with = "instant")]
    pub next_phase_at: Epoch,
}

/// Observer location carried by position requests
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObserverLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Tagged ephemeris request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EphemerisRequest {
    #[serde(rename_all = "camelCase")]
    Positions {
        bodies: Vec<Body>,
        #[serde(with = "instant")]
        instant: Epoch,
        #[serde(default)]
        observer: Option<ObserverLocation>,
        #[serde(default)]
        precision: Precision,
    },
    #[serde(rename_all = "camelCase")]
    Aspects {
        bodies: Vec<Body>,
        #[serde(with = "instant")]
        instant: Epoch,
        orb_tolerance: f64,
        #[serde(default)]
        precision: Precision,
    },
    #[serde(rename_all = "camelCase")]
    Retrogrades {
        body: Body,
        #[serde(with = "instant")]
        start: Epoch,
        #[serde(with = "instant")]
        end: Epoch,
        step_days: f64,
        #[serde(default)]
        precision: Precision,
    },
    #[serde(rename_all = "camelCase")]
    MoonPhase {
        #[serde(with = "instant")]
        instant: Epoch,
        #[serde(default)]
        precision: Precision,
    },
}

impl EphemerisRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Positions { .. } => "positions",
            Self::Aspects { .. } => "aspects",
            Self::Retrogrades { .. } => "retrogrades",
            Self::MoonPhase { .. } => "moonPhase",
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            Self::Positions { precision, .. }
            | Self::Aspects { precision, .. }
            | Self::Retrogrades { precision, .. }
            | Self::MoonPhase { precision, .. } => *precision,
        }
    }
}

/// Tagged reply payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "camelCase")]
pub enum EphemerisPayload {
    Positions(Vec<PlanetaryPosition>),
    Aspects(Vec<AspectRecord>),
    Retrogrades(Vec<RetrogradePeriod>),
    MoonPhase(MoonPhase),
}

impl EphemerisPayload {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Positions(_) => "positions",
            Self::Aspects(_) => "aspects",
            Self::Retrogrades(_) => "retrogrades",
            Self::MoonPhase(_) => "moonPhase",
        }
    }
}

/// Reply with the provenance of its data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EphemerisReply {
    pub provenance: Provenance,
    #[serde(flatten)]
    pub payload: EphemerisPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zodiac_from_longitude() {
        assert_eq!(ZodiacSign::from_longitude(0.0), (ZodiacSign::Aries, 0.0));
        let (sign, degree) = ZodiacSign::from_longitude(95.5);
        assert_eq!(sign, ZodiacSign::Cancer);
        assert!((degree - 5.5).abs() < 1e-9);
        assert_eq!(ZodiacSign::from_longitude(-1.0).0, ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_longitude(359.999).0, ZodiacSign::Pisces);
    }

    #[test]
    fn test_phase_bins() {
        assert_eq!(MoonPhaseName::from_elongation(0.0), MoonPhaseName::NewMoon);
        assert_eq!(MoonPhaseName::from_elongation(350.0), MoonPhaseName::NewMoon);
        assert_eq!(MoonPhaseName::from_elongation(30.0), MoonPhaseName::WaxingCrescent);
        assert_eq!(MoonPhaseName::from_elongation(90.0), MoonPhaseName::FirstQuarter);
        assert_eq!(MoonPhaseName::from_elongation(181.0), MoonPhaseName::FullMoon);
        assert_eq!(MoonPhaseName::from_elongation(300.0), MoonPhaseName::WaningCrescent);
        assert_eq!(MoonPhaseName::WaningCrescent.next(), MoonPhaseName::NewMoon);
    }

    #[test]
    fn test_request_wire_shape() {
        let json = r#"{"op":"aspects","bodies":["sun","mars"],
            "instant":"2024-06-21T00:00:00 UTC","orbTolerance":8.0}"#;
        let req: EphemerisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.operation(), "aspects");
        assert_eq!(req.precision(), Precision::Medium);
        match req {
            EphemerisRequest::Aspects { bodies, orb_tolerance, .. } => {
                assert_eq!(bodies, vec![Body::Sun, Body::Mars]);
                assert_eq!(orb_tolerance, 8.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_instants_are_timestamps_on_the_wire() {
        let instant = Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0);
        let req = EphemerisRequest::MoonPhase { instant, precision: Precision::High };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["op"], "moonPhase");
        assert_eq!(json["instant"], "2024-06-21T00:00:00 UTC");
        let back: EphemerisRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, req);

        let period = RetrogradePeriod {
            body: Body::Mercury,
            station_retrograde: Some(Epoch::from_gregorian_utc(2024, 8, 5, 0, 0, 0, 0)),
            station_direct: None,
            pre_shadow: Some(Epoch::from_gregorian_utc(2024, 7, 22, 0, 0, 0, 0)),
            post_shadow: None,
            peak_speed: -1.4,
        };
        let json = serde_json::to_value(&period).unwrap();
        assert_eq!(json["stationRetrograde"], "2024-08-05T00:00:00 UTC");
        assert!(json["stationDirect"].is_null());
        let back: RetrogradePeriod = serde_json::from_value(json).unwrap();
        assert_eq!(back, period);

        let bad = r#"{"op":"moonPhase","instant":{"centuries":1}}"#;
        assert!(serde_json::from_str::<EphemerisRequest>(bad).is_err());
    }

    #[test]
    fn test_reply_wire_shape() {
        let reply = EphemerisReply {
            provenance: Provenance::Synthetic,
            payload: EphemerisPayload::Aspects(Vec::new()),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["provenance"], "synthetic");
        assert_eq!(json["op"], "aspects");
        let back: EphemerisReply = serde_json::from_value(json).unwrap();
        assert_eq!(back, reply);
    }
}
