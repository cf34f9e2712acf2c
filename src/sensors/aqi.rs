//! US EPA AQI from a PM2.5 concentration.

/// One row of the breakpoint table: concentrations above `above` use this band.
struct Band {
    above: f64,
    index_low: f64,
    index_high: f64,
    bp_low: f64,
    bp_high: f64,
}

const BANDS: [Band; 6] = [
    Band { above: 350.5, index_low: 401.0, index_high: 500.0, bp_low: 350.5, bp_high: 500.4 },
    Band { above: 250.5, index_low: 301.0, index_high: 400.0, bp_low: 250.5, bp_high: 350.4 },
    Band { above: 150.5, index_low: 201.0, index_high: 300.0, bp_low: 150.5, bp_high: 250.4 },
    Band { above: 55.5, index_low: 151.0, index_high: 200.0, bp_low: 55.5, bp_high: 150.4 },
    Band { above: 35.5, index_low: 101.0, index_high: 150.0, bp_low: 35.5, bp_high: 55.4 },
    Band { above: 12.1, index_low: 51.0, index_high: 100.0, bp_low: 12.1, bp_high: 35.4 },
];

const LOWEST: Band = Band {
    above: f64::NEG_INFINITY,
    index_low: 0.0,
    index_high: 50.0,
    bp_low: 0.0,
    bp_high: 12.0,
};

/// Convert a PM2.5 reading (ug/m3) to an AQI value.
///
/// Negative input is passed through so the "no reading" sentinel survives.
/// Only the band slope is rounded; the final value is truncated toward zero.
pub fn pm_to_aqi(raw: f64) -> i32 {
    if raw < 0.0 {
        return raw as i32;
    }
    if raw > 1000.0 {
        return 500;
    }

    let band = BANDS.iter().find(|b| raw > b.above).unwrap_or(&LOWEST);
    let slope = ((band.index_high - band.index_low) / (band.bp_high - band.bp_low)).round();
    (slope * (raw - band.bp_low) + band.index_low) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::NO_READING;

    #[test]
    fn sentinel_passes_through() {
        assert_eq!(pm_to_aqi(NO_READING), -1);
    }

    #[test]
    fn saturates_above_one_thousand() {
        assert_eq!(pm_to_aqi(1000.1), 500);
        assert_eq!(pm_to_aqi(5000.0), 500);
    }

    #[test]
    fn clean_air_is_zero() {
        assert_eq!(pm_to_aqi(0.0), 0);
    }

    #[test]
    fn band_edges_use_strict_comparison() {
        // 35.5 is not above 35.5, so it still belongs to the 12.1 band.
        assert_eq!(pm_to_aqi(35.5), 97);
        assert_eq!(pm_to_aqi(12.1), 48);
        assert_eq!(pm_to_aqi(13.0), 52);
    }

    #[test]
    fn known_values_per_band() {
        assert_eq!(pm_to_aqi(12.0), 48);
        assert_eq!(pm_to_aqi(40.0), 110);
        assert_eq!(pm_to_aqi(100.0), 195);
        assert_eq!(pm_to_aqi(151.0), 201);
        assert_eq!(pm_to_aqi(300.0), 350);
        assert_eq!(pm_to_aqi(400.0), 450);
    }

    #[test]
    fn monotonic_within_each_band() {
        let edges = [0.0, 12.1, 35.5, 55.5, 150.5, 250.5, 350.5, 1000.0];
        for pair in edges.windows(2) {
            let (low, high) = (pair[0], pair[1]);
            let mut previous = pm_to_aqi(low + 0.01);
            let mut x = low + 0.01;
            while x <= high {
                let current = pm_to_aqi(x);
                assert!(
                    current >= previous,
                    "aqi fell from {previous} to {current} at {x} in ({low}, {high}]"
                );
                previous = current;
                x += 0.25;
            }
        }
    }

    #[test]
    fn output_stays_in_range() {
        let mut x = 0.0;
        while x <= 1200.0 {
            let aqi = pm_to_aqi(x);
            assert!(aqi >= 0, "negative aqi at {x}");
            x += 0.5;
        }
    }
}
