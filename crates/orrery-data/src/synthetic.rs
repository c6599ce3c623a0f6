//! Deterministic synthetic star fields
//!
//! Used whenever no real catalog data is reachable. Stars follow the observed
//! number-magnitude law `N(m) ∝ 10^(0.6m)` and concentrate toward the galactic
//! plane, so the result looks like a plausible sky rather than uniform noise.

use crate::stars::{constellation_for, ProperMotion, StarRecord};
use orrery_core::{CatalogId, GalacticCoordinate};

/// Brightest magnitude the generator produces; brighter stars come from the real table
pub const SYNTHETIC_BRIGHT_LIMIT: f64 = 2.0;

/// Upper bound on generated candidates
pub const MAX_SYNTHETIC_STARS: usize = 100_000;

/// Width of the galactic latitude distribution (degrees)
const GALACTIC_LATITUDE_SIGMA: f64 = 30.0;

/// PCG-style linear congruential generator
#[derive(Clone, Debug)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Standard normal via Box-Muller
    pub fn next_gaussian(&mut self) -> f64 {
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    pub fn next_index(&mut self, n: usize) -> usize {
        ((self.next_f64() * n as f64) as usize).min(n.saturating_sub(1))
    }
}

/// Stable per-catalog seed (FNV-1a over the catalog id)
pub fn catalog_seed(catalog: CatalogId) -> u64 {
    catalog
        .as_str()
        .bytes()
        .fold(0xcbf29ce484222325, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3))
}

/// Number of candidates for a magnitude limit: `min(100000, 10^(m/2.5))`, bounded by `limit`
pub fn synthetic_star_count(max_magnitude: f64, limit: Option<usize>) -> usize {
    let natural = 10f64.powf(max_magnitude / 2.5).floor();
    let count = if natural.is_finite() && natural > 0.0 {
        (natural as usize).min(MAX_SYNTHETIC_STARS)
    } else {
        0
    };
    limit.map_or(count, |l| count.min(l))
}

/// Inverse CDF of `10^(0.6m)` on `[a, b]`
fn sample_magnitude(u: f64, a: f64, b: f64) -> f64 {
    let lo = 10f64.powf(0.6 * a);
    let hi = 10f64.powf(0.6 * b);
    ((lo + u * (hi - lo)).log10() / 0.6).clamp(a, b)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SpectralType {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
}

impl SpectralType {
    fn letter(self) -> char {
        match self {
            Self::O => 'O',
            Self::B => 'B',
            Self::A => 'A',
            Self::F => 'F',
            Self::G => 'G',
            Self::K => 'K',
            Self::M => 'M',
        }
    }

    /// Main-sequence absolute magnitude
    fn absolute_magnitude(self) -> f64 {
        match self {
            Self::O => -5.7,
            Self::B => -1.1,
            Self::A => 1.4,
            Self::F => 3.0,
            Self::G => 4.6,
            Self::K => 5.9,
            Self::M => 9.0,
        }
    }

    fn color_index(self) -> f64 {
        match self {
            Self::O => -0.33,
            Self::B => -0.17,
            Self::A => 0.0,
            Self::F => 0.38,
            Self::G => 0.63,
            Self::K => 1.0,
            Self::M => 1.40,
        }
    }

    /// Bright stars skew toward hot giants; the faint field is dominated by K and M
    fn sample(u: f64, magnitude: f64) -> Self {
        let cumulative: [(f64, Self); 6] = if magnitude < 2.0 {
            [(0.05, Self::O), (0.15, Self::B), (0.30, Self::A), (0.45, Self::F), (0.60, Self::G), (0.80, Self::K)]
        } else {
            [(0.001, Self::O), (0.01, Self::B), (0.05, Self::A), (0.15, Self::F), (0.30, Self::G), (0.60, Self::K)]
        };
        cumulative
            .iter()
            .find(|(p, _)| u < *p)
            .map_or(Self::M, |(_, t)| *t)
    }
}

const LUMINOSITY_CLASSES: [&str; 5] = ["I", "II", "III", "IV", "V"];

/// Generate `count` synthetic stars no brighter than [`SYNTHETIC_BRIGHT_LIMIT`]
///
/// Output is a pure function of `(seed, max_magnitude, count)`.
pub fn generate_synthetic_stars(seed: u64, max_magnitude: f64, count: usize) -> Vec<StarRecord> {
    if !(max_magnitude > SYNTHETIC_BRIGHT_LIMIT) {
        return Vec::new();
    }
    let mut rng = Lcg::new(seed);

    (0..count)
        .map(|i| {
            let magnitude = sample_magnitude(rng.next_f64(), SYNTHETIC_BRIGHT_LIMIT, max_magnitude);

            let l = rng.next_f64() * 360.0;
            let b = (rng.next_gaussian() * GALACTIC_LATITUDE_SIGMA).clamp(-90.0, 90.0);
            let position = GalacticCoordinate::new(l, b).to_equatorial();

            let class = SpectralType::sample(rng.next_f64(), magnitude);
            let subclass = rng.next_index(10);
            let luminosity = if magnitude < 3.0 {
                LUMINOSITY_CLASSES[rng.next_index(LUMINOSITY_CLASSES.len())]
            } else {
                "V"
            };

            // Distance modulus m - M = 5 log10(d) - 5
            let distance_pc = 10f64.powf((magnitude - class.absolute_magnitude() + 5.0) / 5.0);

            StarRecord {
                id: format!("SYN{i}"),
                name: None,
                position,
                magnitude,
                color_index: class.color_index(),
                spectral_class: format!("{}{}{}", class.letter(), subclass, luminosity),
                proper_motion: ProperMotion::default(),
                parallax: None,
                distance_pc: Some(distance_pc),
                constellation: constellation_for(position.ra, position.dec).to_string(),
            }
        })
        .collect()
}
