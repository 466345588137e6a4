/// Linear magnitude to dB, floored so silence maps to a finite value.
#[inline]
pub fn gain_to_db(gain: f32, floor_db: f32) -> f32 {
    if gain <= 0.0 {
        return floor_db;
    }
    (20.0 * gain.log10()).max(floor_db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_to_db() {
        assert!((gain_to_db(0.5, -100.0) + 6.0206).abs() < 1e-3);
        assert_eq!(gain_to_db(0.0, -100.0), -100.0);
        assert_eq!(gain_to_db(1e-9, -100.0), -100.0);
    }
}
