//! Star records and the CSV/JSON layouts they are decoded from

use crate::error::{DataError, DataResult};
use orrery_core::constants::LIGHT_YEARS_PER_PARSEC;
use orrery_core::EquatorialCoordinate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Proper motion in milliarcseconds per year
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProperMotion {
    /// μα·cos δ
    pub ra: f64,
    pub dec: f64,
}

/// Immutable catalog entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub position: EquatorialCoordinate,
    /// Apparent visual magnitude
    pub magnitude: f64,
    /// B-V color index
    pub color_index: f64,
    pub spectral_class: String,
    #[serde(default)]
    pub proper_motion: ProperMotion,
    /// Parallax in milliarcseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallax: Option<f64>,
    /// Distance in parsecs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_pc: Option<f64>,
    /// IAU three-letter constellation abbreviation
    pub constellation: String,
}

impl StarRecord {
    /// Direction on the unit sphere (J2000 equatorial frame)
    pub fn unit_vector(&self) -> [f32; 3] {
        let v = self.position.to_unit_vector();
        [v.x as f32, v.y as f32, v.z as f32]
    }

    /// Distance in parsecs, from the catalog value or the parallax
    pub fn distance(&self) -> Option<f64> {
        self.distance_pc.or_else(|| {
            self.parallax.filter(|p| *p > 0.0 && p.is_finite()).map(|p| 1000.0 / p)
        })
    }

    pub fn distance_light_years(&self) -> Option<f64> {
        self.distance().map(|pc| pc * LIGHT_YEARS_PER_PARSEC)
    }

    /// Absolute magnitude from apparent magnitude and distance
    pub fn absolute_magnitude(&self) -> Option<f64> {
        // M = m - 5*log10(d) + 5
        self.distance().map(|d| self.magnitude - 5.0 * d.log10() + 5.0)
    }

    /// Display label: common name when known, else the catalog id
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Catalog order: brightest first, ties by id
pub fn catalog_order(a: &StarRecord, b: &StarRecord) -> Ordering {
    a.magnitude.total_cmp(&b.magnitude).then_with(|| a.id.cmp(&b.id))
}

/// CSV record matching Gaia DR3 export format
#[derive(Debug, Deserialize)]
struct GaiaCsvRecord {
    source_id: Option<u64>,
    ra: Option<f64>,
    dec: Option<f64>,
    parallax: Option<f64>,
    phot_g_mean_mag: Option<f64>,
    bp_rp: Option<f64>,
    pmra: Option<f64>,
    pmdec: Option<f64>,
}

impl GaiaCsvRecord {
    fn to_star_record(&self) -> Option<StarRecord> {
        let bp_rp = self.bp_rp.unwrap_or(0.82);
        Some(StarRecord {
            id: format!("Gaia{}", self.source_id?),
            name: None,
            position: EquatorialCoordinate::j2000(self.ra?, self.dec?),
            magnitude: self.phot_g_mean_mag?,
            color_index: bp_rp_to_bv(bp_rp),
            spectral_class: spectral_class_for_bv(bp_rp_to_bv(bp_rp)).to_string(),
            proper_motion: ProperMotion {
                ra: self.pmra.unwrap_or(0.0),
                dec: self.pmdec.unwrap_or(0.0),
            },
            parallax: self.parallax.filter(|p| *p > 0.0),
            distance_pc: None,
            constellation: constellation_for(self.ra?, self.dec?).to_string(),
        })
    }
}

/// CSV record for Hipparcos / Yale style exports
#[derive(Debug, Deserialize)]
struct CatalogCsvRecord {
    #[serde(alias = "hip")]
    id: String,
    #[serde(default, alias = "proper")]
    name: Option<String>,
    ra: f64,
    dec: f64,
    #[serde(alias = "mag", alias = "vmag")]
    magnitude: f64,
    #[serde(default, alias = "ci", alias = "b_v")]
    color_index: Option<f64>,
    #[serde(default, alias = "spect")]
    spectral_class: Option<String>,
    #[serde(default, alias = "pmra")]
    pm_ra: Option<f64>,
    #[serde(default, alias = "pmdec")]
    pm_dec: Option<f64>,
    #[serde(default, alias = "plx")]
    parallax: Option<f64>,
    #[serde(default, alias = "con")]
    constellation: Option<String>,
}

impl CatalogCsvRecord {
    fn into_star_record(self) -> StarRecord {
        let color_index = self.color_index.unwrap_or(0.65);
        let id = if self.id.chars().all(|c| c.is_ascii_digit()) {
            format!("HIP{}", self.id)
        } else {
            self.id
        };
        StarRecord {
            id,
            name: self.name.filter(|n| !n.trim().is_empty()),
            position: EquatorialCoordinate::j2000(self.ra, self.dec),
            magnitude: self.magnitude,
            color_index,
            spectral_class: self
                .spectral_class
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| spectral_class_for_bv(color_index).to_string()),
            proper_motion: ProperMotion {
                ra: self.pm_ra.unwrap_or(0.0),
                dec: self.pm_dec.unwrap_or(0.0),
            },
            parallax: self.parallax.filter(|p| *p > 0.0),
            distance_pc: None,
            constellation: self
                .constellation
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| constellation_for(self.ra, self.dec).to_string()),
        }
    }
}

/// Decode catalog CSV. Gaia exports are recognized by their `phot_g_mean_mag` column.
pub fn decode_csv(bytes: &[u8]) -> DataResult<Vec<StarRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);
    let gaia = reader.headers()?.iter().any(|h| h == "phot_g_mean_mag");

    let mut stars = Vec::new();
    if gaia {
        for result in reader.deserialize() {
            let record: GaiaCsvRecord = result?;
            if let Some(star) = record.to_star_record() {
                stars.push(star);
            }
        }
    } else {
        for result in reader.deserialize() {
            let record: CatalogCsvRecord = result?;
            stars.push(record.into_star_record());
        }
    }

    if stars.iter().any(|s| !s.magnitude.is_finite()) {
        return Err(DataError::Decode("non-finite magnitude in catalog".into()));
    }
    Ok(stars)
}

/// Decode a JSON array of star records
pub fn decode_json(bytes: &[u8]) -> DataResult<Vec<StarRecord>> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Approximate B-V from Gaia BP-RP (linear fit over F-K dwarfs)
pub fn bp_rp_to_bv(bp_rp: f64) -> f64 {
    ((bp_rp - 0.05) / 1.2).clamp(-0.4, 2.0)
}

/// Coarse spectral class letter for a B-V color index
pub fn spectral_class_for_bv(bv: f64) -> &'static str {
    match bv {
        x if x < -0.25 => "O",
        x if x < -0.05 => "B",
        x if x < 0.25 => "A",
        x if x < 0.5 => "F",
        x if x < 0.8 => "G",
        x if x < 1.35 => "K",
        _ => "M",
    }
}

/// Coarse constellation from RA/Dec bands; not the IAU boundaries
pub fn constellation_for(ra: f64, dec: f64) -> &'static str {
    if dec > 55.0 {
        return "UMa";
    }
    if dec < -55.0 {
        return "Cru";
    }
    match (ra.rem_euclid(360.0) / 15.0) as u32 {
        0..=2 => "Psc",
        3..=5 => "Ori",
        6..=8 => "Leo",
        9..=11 => "Vir",
        12..=14 => "Sco",
        15..=17 => "Sgr",
        18..=20 => "Cyg",
        _ => "And",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_gaia_csv() {
        let csv = "source_id,ra,dec,parallax,phot_g_mean_mag,bp_rp,pmra,pmdec\n\
                   42,10.5,-20.25,5.0,7.1,0.9,1.5,-2.0\n\
                   43,,10.0,1.0,8.0,1.0,,\n";
        let stars = decode_csv(csv.as_bytes()).unwrap();
        assert_eq!(stars.len(), 1, "row without ra is skipped");
        let s = &stars[0];
        assert_eq!(s.id, "Gaia42");
        assert!((s.distance().unwrap() - 200.0).abs() < 1e-9);
        assert_eq!(s.proper_motion.dec, -2.0);
    }

    #[test]
    fn test_decode_hipparcos_csv_with_aliases() {
        let csv = "hip,proper,ra,dec,mag,ci,spect,con\n\
                   32349,Sirius,101.287155,-16.716116,-1.46,0.00,A1V,CMa\n\
                   99999,,300.0,60.0,5.5,,,\n";
        let stars = decode_csv(csv.as_bytes()).unwrap();
        assert_eq!(stars[0].id, "HIP32349");
        assert_eq!(stars[0].label(), "Sirius");
        assert_eq!(stars[1].name, None);
        assert_eq!(stars[1].constellation, "UMa");
        assert_eq!(stars[1].spectral_class, "G");
    }

    #[test]
    fn test_decode_json_round_trip_shape() {
        let json = r#"[{"id":"X1","position":{"ra":1.0,"dec":2.0,"epoch":2000.0},
            "magnitude":4.2,"colorIndex":0.3,"spectralClass":"F0V","constellation":"And"}]"#;
        let stars = decode_json(json.as_bytes()).unwrap();
        assert_eq!(stars[0].proper_motion, ProperMotion::default());
        assert!(stars[0].parallax.is_none());
    }

    #[test]
    fn test_catalog_order_breaks_ties_by_id() {
        let mk = |id: &str, m: f64| StarRecord {
            id: id.into(),
            name: None,
            position: EquatorialCoordinate::j2000(0.0, 0.0),
            magnitude: m,
            color_index: 0.0,
            spectral_class: "A".into(),
            proper_motion: ProperMotion::default(),
            parallax: None,
            distance_pc: None,
            constellation: "Psc".into(),
        };
        let mut v = vec![mk("b", 2.0), mk("a", 2.0), mk("c", 1.0)];
        v.sort_by(catalog_order);
        let ids: Vec<_> = v.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn test_unit_vector_normalized() {
        let s = StarRecord {
            id: "v".into(),
            name: None,
            position: EquatorialCoordinate::j2000(279.234735, 38.783689),
            magnitude: 0.03,
            color_index: 0.0,
            spectral_class: "A0V".into(),
            proper_motion: ProperMotion::default(),
            parallax: Some(130.23),
            distance_pc: None,
            constellation: "Lyr".into(),
        };
        let [x, y, z] = s.unit_vector();
        assert!(((x * x + y * y + z * z) - 1.0).abs() < 1e-6);
        assert!((s.distance_light_years().unwrap() - 25.04).abs() < 0.05);
    }
}
