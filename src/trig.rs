use std::f32::consts::TAU;

pub const DEFAULT_TABLE_SIZE: usize = 2048;
const DEGREE_SLOTS: usize = 361;

/// Precomputed sine/cosine tables.
///
/// The radian tables hold one full turn split into a power-of-two number of
/// buckets, so any angle (negative or past 2π) maps to a bucket with a mask.
/// A second, smaller table covers whole degrees 0..=360.
pub struct AngleCache {
    table_size: usize,
    mask: i64,
    angle_to_index: f32,
    sin_table: Vec<f32>,
    cos_table: Vec<f32>,
    sin_degrees: Vec<f32>,
    cos_degrees: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleCacheStats {
    pub table_size: usize,
    pub mask: usize,
    pub angle_to_index: f32,
    pub sin_table_bytes: usize,
    pub cos_table_bytes: usize,
    pub degree_cache_bytes: usize,
}

impl AngleCacheStats {
    pub fn total_bytes(&self) -> usize {
        self.sin_table_bytes + self.cos_table_bytes + self.degree_cache_bytes
    }
}

impl AngleCache {
    /// Builds the tables. `requested` is rounded up to the next power of two;
    /// zero becomes a single bucket.
    pub fn new(requested: usize) -> Self {
        let table_size = requested.max(1).next_power_of_two();
        if table_size != requested {
            log::warn!(
                "angle cache size {} rounded up to {}",
                requested,
                table_size
            );
        }

        // One extra slot so interpolation can read `index + 1` at the seam.
        let (sin_table, cos_table): (Vec<f32>, Vec<f32>) = (0..=table_size)
            .map(|i| {
                let angle = i as f64 / table_size as f64 * std::f64::consts::TAU;
                (angle.sin() as f32, angle.cos() as f32)
            })
            .unzip();

        let (sin_degrees, cos_degrees): (Vec<f32>, Vec<f32>) = (0..DEGREE_SLOTS)
            .map(|deg| {
                let angle = (deg as f64).to_radians();
                (angle.sin() as f32, angle.cos() as f32)
            })
            .unzip();

        Self {
            table_size,
            mask: table_size as i64 - 1,
            angle_to_index: table_size as f32 / TAU,
            sin_table,
            cos_table,
            sin_degrees,
            cos_degrees,
        }
    }

    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Bucket index for `angle`, always in `[0, table_size)`.
    #[inline]
    pub fn bucket(&self, angle: f32) -> usize {
        ((angle * self.angle_to_index).floor() as i64 & self.mask) as usize
    }

    /// Direct bucket lookup, no interpolation.
    #[inline]
    pub fn ultra_fast_sin(&self, angle: f32) -> f32 {
        self.sin_table[self.bucket(angle)]
    }

    #[inline]
    pub fn ultra_fast_cos(&self, angle: f32) -> f32 {
        self.cos_table[self.bucket(angle)]
    }

    /// Bucket lookup blended linearly toward the next bucket.
    pub fn precise_sin(&self, angle: f32) -> f32 {
        Self::interpolate(&self.sin_table, self.fractional_index(angle), self.mask)
    }

    pub fn precise_cos(&self, angle: f32) -> f32 {
        Self::interpolate(&self.cos_table, self.fractional_index(angle), self.mask)
    }

    /// Both precise values at once.
    pub fn precise_sin_cos(&self, angle: f32) -> (f32, f32) {
        let exact = self.fractional_index(angle);
        (
            Self::interpolate(&self.sin_table, exact, self.mask),
            Self::interpolate(&self.cos_table, exact, self.mask),
        )
    }

    /// Sine of a whole number of degrees. The fractional part is dropped.
    pub fn sin_degrees(&self, degrees: f32) -> f32 {
        let value = self.sin_degrees[Self::degree_slot(degrees)];
        if degrees < 0.0 { -value } else { value }
    }

    pub fn cos_degrees(&self, degrees: f32) -> f32 {
        self.cos_degrees[Self::degree_slot(degrees)]
    }

    pub fn stats(&self) -> AngleCacheStats {
        let float = std::mem::size_of::<f32>();
        AngleCacheStats {
            table_size: self.table_size,
            mask: self.mask as usize,
            angle_to_index: self.angle_to_index,
            sin_table_bytes: self.sin_table.len() * float,
            cos_table_bytes: self.cos_table.len() * float,
            degree_cache_bytes: (self.sin_degrees.len() + self.cos_degrees.len()) * float,
        }
    }

    fn fractional_index(&self, angle: f32) -> f32 {
        angle.rem_euclid(TAU) * self.angle_to_index
    }

    fn interpolate(table: &[f32], exact: f32, mask: i64) -> f32 {
        let base = exact.floor();
        let t = exact - base;
        // rem_euclid can round up to exactly TAU; the mask folds it back to 0.
        let index = (base as i64 & mask) as usize;
        let next = ((base as i64 + 1) & mask) as usize;
        table[index] * (1.0 - t) + table[next] * t
    }

    fn degree_slot(degrees: f32) -> usize {
        if !degrees.is_finite() {
            return 0;
        }
        (degrees.abs().floor() as u64 % 360) as usize
    }
}

impl Default for AngleCache {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_table_size_rounds_up() {
        assert_eq!(AngleCache::new(0).table_size(), 1);
        assert_eq!(AngleCache::new(1).table_size(), 1);
        assert_eq!(AngleCache::new(1000).table_size(), 1024);
        assert_eq!(AngleCache::new(2048).table_size(), 2048);
        assert_eq!(AngleCache::new(2049).table_size(), 4096);
    }

    #[test]
    fn test_bucket_wraps_for_any_angle() {
        let cache = AngleCache::default();
        for angle in [-100.0, -TAU, -PI, -0.001, 0.0, 0.5, TAU, 3.0 * TAU + 0.2, 1e4] {
            let bucket = cache.bucket(angle);
            assert!(bucket < cache.table_size(), "angle {angle} -> {bucket}");
        }
    }

    #[test]
    fn test_ultra_fast_error_bounded_by_bucket_width() {
        let cache = AngleCache::default();
        let bucket_width = TAU / cache.table_size() as f32;
        let mut angle = -3.0 * TAU;
        while angle < 3.0 * TAU {
            assert_abs_diff_eq!(cache.ultra_fast_sin(angle), angle.sin(), epsilon = bucket_width * 1.01);
            assert_abs_diff_eq!(cache.ultra_fast_cos(angle), angle.cos(), epsilon = bucket_width * 1.01);
            angle += 0.037;
        }
    }

    #[test]
    fn test_negative_angles_match_positive_equivalent() {
        let cache = AngleCache::default();
        // -π/2 and 3π/2 land in the same bucket.
        assert_abs_diff_eq!(cache.ultra_fast_sin(-PI / 2.0), -1.0, epsilon = 0.01);
        assert_abs_diff_eq!(
            cache.ultra_fast_sin(-PI / 2.0),
            cache.ultra_fast_sin(1.5 * PI),
            epsilon = 0.01
        );
    }

    #[test]
    fn test_precise_is_tighter_than_ultra_fast() {
        let cache = AngleCache::default();
        let mut worst_fast = 0.0f32;
        let mut worst_precise = 0.0f32;
        let mut angle = -TAU;
        while angle < TAU {
            worst_fast = worst_fast.max((cache.ultra_fast_sin(angle) - angle.sin()).abs());
            worst_precise = worst_precise.max((cache.precise_sin(angle) - angle.sin()).abs());
            assert_abs_diff_eq!(cache.precise_cos(angle), angle.cos(), epsilon = 1e-4);
            angle += 0.0123;
        }
        assert!(worst_precise < 1e-4);
        assert!(worst_precise < worst_fast);
    }

    #[test]
    fn test_precise_exact_at_zero() {
        let cache = AngleCache::default();
        let (sin, cos) = cache.precise_sin_cos(0.0);
        assert_eq!(sin, 0.0);
        assert_eq!(cos, 1.0);
    }

    #[test]
    fn test_degree_cache() {
        let cache = AngleCache::default();
        assert_abs_diff_eq!(cache.sin_degrees(90.0), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cache.sin_degrees(-90.0), -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cache.cos_degrees(-180.0), -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cache.sin_degrees(390.0), 0.5, epsilon = 1e-6);
        assert_eq!(cache.sin_degrees(f32::NAN), 0.0);
    }

    #[test]
    fn test_stats() {
        let stats = AngleCache::new(16).stats();
        assert_eq!(stats.table_size, 16);
        assert_eq!(stats.mask, 15);
        assert_eq!(stats.sin_table_bytes, 17 * 4);
        assert_eq!(stats.degree_cache_bytes, 2 * 361 * 4);
        assert_eq!(stats.total_bytes(), 2 * 17 * 4 + 2 * 361 * 4);
    }
}
