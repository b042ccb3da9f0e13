const AF_START: f64 = 0.02;
const AF_STEP: f64 = 0.02;
const AF_MAX: f64 = 0.2;

/// Parabolic SAR over high/low series, newest last.
///
/// The stop accelerates toward price: the acceleration factor starts at
/// 0.02, grows by 0.02 each time the trend makes a new extreme, and caps at
/// 0.2. When price crosses the current SAR the trend flips and SAR resets
/// to the extreme of the abandoned trend.
///
/// Returns the SAR value for the newest bar, or `None` when the series is
/// shorter than two bars or the slices disagree in length.
pub fn calculate_parabolic_sar(highs: &[f64], lows: &[f64]) -> Option<f64> {
    if highs.len() != lows.len() || highs.len() < 2 {
        return None;
    }

    let mut rising = highs[1] >= highs[0];
    let mut sar = if rising { lows[0] } else { highs[0] };
    let mut extreme = if rising { highs[1] } else { lows[1] };
    let mut af = AF_START;

    for i in 2..highs.len() {
        sar += af * (extreme - sar);

        if rising {
            if lows[i] < sar {
                rising = false;
                sar = extreme;
                extreme = lows[i];
                af = AF_START;
            } else if highs[i] > extreme {
                extreme = highs[i];
                af = (af + AF_STEP).min(AF_MAX);
            }
        } else if highs[i] > sar {
            rising = true;
            sar = extreme;
            extreme = highs[i];
            af = AF_START;
        } else if lows[i] < extreme {
            extreme = lows[i];
            af = (af + AF_STEP).min(AF_MAX);
        }
    }

    Some(sar)
}
