//! B-V color index to display color

/// Upper B-V bound and linear RGB for each band; the last band is open-ended
pub const BV_BANDS: [(f32, [f32; 3]); 7] = [
    (-0.3, [0.6, 0.7, 1.0]),
    (0.0, [0.7, 0.75, 1.0]),
    (0.3, [0.8, 0.85, 1.0]),
    (0.6, [1.0, 0.97, 0.9]),
    (1.0, [1.0, 0.9, 0.7]),
    (1.4, [1.0, 0.8, 0.6]),
    (f32::MAX, [1.0, 0.7, 0.4]),
];

/// Band color for a B-V index. Same lookup the star shader does on the uniform copy.
pub fn bv_to_rgb(bv: f32) -> [f32; 3] {
    let bv = if bv.is_finite() { bv } else { 0.0 };
    BV_BANDS
        .iter()
        .find(|(upper, _)| bv < *upper)
        .map(|(_, rgb)| *rgb)
        .unwrap_or(BV_BANDS[BV_BANDS.len() - 1].1)
}

/// The table packed as `vec4(r, g, b, upper_bound)` rows for the uniform buffer
pub fn bv_lut() -> [[f32; 4]; 7] {
    let mut rows = [[0.0; 4]; 7];
    for (row, (upper, rgb)) in rows.iter_mut().zip(BV_BANDS.iter()) {
        *row = [rgb[0], rgb[1], rgb[2], *upper];
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(bv_to_rgb(-0.5), [0.6, 0.7, 1.0]);
        assert_eq!(bv_to_rgb(-0.3), [0.7, 0.75, 1.0]);
        assert_eq!(bv_to_rgb(0.65), [1.0, 0.9, 0.7]);
        assert_eq!(bv_to_rgb(1.85), [1.0, 0.7, 0.4]);
    }

    #[test]
    fn test_non_finite_reads_as_white() {
        assert_eq!(bv_to_rgb(f32::NAN), bv_to_rgb(0.0));
    }

    #[test]
    fn test_lut_rows_ascend() {
        let lut = bv_lut();
        assert!(lut.windows(2).all(|w| w[0][3] < w[1][3]));
        assert_eq!(lut[6][3], f32::MAX);
    }
}
