// =============================================================================
// Cumulative Volume Delta (CVD) — Candle-volume momentum proxy
// =============================================================================
//
// Delta is the period-over-period change in candle volume:
//   delta[0] = 0
//   delta[i] = volume[i] - volume[i-1]
//   cvd[i]   = delta[0] + ... + delta[i]
//
// Rows are taken in the order given; nothing is re-sorted.

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;

/// A candle with the two derived CVD columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvdCandle {
    #[serde(flatten)]
    pub candle: Candle,
    pub delta_volume: f64,
    pub cvd: f64,
}

/// Derive `delta_volume` and `cvd` for every candle.
pub fn derive_cvd(candles: &[Candle]) -> Vec<CvdCandle> {
    let mut result = Vec::with_capacity(candles.len());
    let mut prev_volume: Option<f64> = None;
    let mut running = 0.0;

    for candle in candles {
        let delta = prev_volume.map_or(0.0, |prev| candle.volume - prev);
        running += delta;
        prev_volume = Some(candle.volume);
        result.push(CvdCandle {
            candle: candle.clone(),
            delta_volume: delta,
            cvd: running,
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn candles(volumes: &[f64]) -> Vec<Candle> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| Candle {
                time: DateTime::from_timestamp_millis(i as i64 * 3_600_000).unwrap(),
                open: 100.0,
                high: 110.0,
                low: 90.0,
                close: 105.0,
                volume,
            })
            .collect()
    }

    #[test]
    fn two_candle_example() {
        let out = derive_cvd(&candles(&[10.0, 16.0]));
        let deltas: Vec<f64> = out.iter().map(|c| c.delta_volume).collect();
        let cvd: Vec<f64> = out.iter().map(|c| c.cvd).collect();
        assert_eq!(deltas, vec![0.0, 6.0]);
        assert_eq!(cvd, vec![0.0, 6.0]);
    }

    #[test]
    fn first_delta_is_zero_and_last_cvd_is_sum() {
        let out = derive_cvd(&candles(&[5.0, 3.0, 9.0, 9.0, 1.5, 20.25]));
        assert_eq!(out[0].delta_volume, 0.0);
        let sum: f64 = out.iter().map(|c| c.delta_volume).sum();
        assert!((out.last().unwrap().cvd - sum).abs() < 1e-10);
        // Telescoping sum: last volume minus first volume.
        assert!((sum - (20.25 - 5.0)).abs() < 1e-10);
    }

    #[test]
    fn idempotent() {
        let input = candles(&[1.0, 4.0, 2.0]);
        assert_eq!(derive_cvd(&input), derive_cvd(&input));
    }

    #[test]
    fn empty_in_empty_out() {
        assert!(derive_cvd(&[]).is_empty());
    }

    #[test]
    fn keeps_base_columns() {
        let input = candles(&[7.0]);
        let out = derive_cvd(&input);
        assert_eq!(out[0].candle, input[0]);
        assert_eq!(out[0].cvd, 0.0);
    }
}
