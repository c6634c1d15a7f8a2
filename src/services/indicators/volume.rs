//! Volume indicators.

use super::sma::sma;

pub const VOLUME_SMA_PERIOD: usize = 20;

/// Volume SMA(20) and the ratio of each bar's volume to it.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSeries {
    pub sma: Vec<Option<f64>>,
    pub ratio: Vec<Option<f64>>,
}

/// Ratio is undefined where the average is undefined or zero.
pub fn volume_indicators(volumes: &[f64], period: usize) -> VolumeSeries {
    let average = sma(volumes, period);
    let ratio = volumes
        .iter()
        .zip(average.iter())
        .map(|(v, avg)| match avg {
            Some(a) if *a != 0.0 => Some(v / a),
            _ => None,
        })
        .collect();

    VolumeSeries {
        sma: average,
        ratio,
    }
}
