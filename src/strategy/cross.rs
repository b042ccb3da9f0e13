/// Two consecutive MACD readings, previous candle first.
///
/// A crossover is strict on both sides: touching the signal line on either
/// candle counts as no cross.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdCross {
    pub prev_macd_line: f64,
    pub prev_signal_line: f64,
    pub current_macd_line: f64,
    pub current_signal_line: f64,
}

impl MacdCross {
    /// MACD line closed above the signal line on the newest candle.
    pub fn is_up_cross(&self) -> bool {
        self.prev_macd_line < self.prev_signal_line
            && self.current_macd_line > self.current_signal_line
    }

    /// MACD line closed below the signal line on the newest candle.
    pub fn is_down_cross(&self) -> bool {
        self.prev_macd_line > self.prev_signal_line
            && self.current_macd_line < self.current_signal_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_cross() {
        let cross = MacdCross {
            prev_macd_line: -1.0,
            prev_signal_line: 0.5,
            current_macd_line: 2.0,
            current_signal_line: 1.0,
        };

        assert!(cross.is_up_cross());
        assert!(!cross.is_down_cross());
    }

    #[test]
    fn test_down_cross() {
        let cross = MacdCross {
            prev_macd_line: 2.0,
            prev_signal_line: 1.0,
            current_macd_line: -1.0,
            current_signal_line: 0.5,
        };

        assert!(cross.is_down_cross());
        assert!(!cross.is_up_cross());
    }

    #[test]
    fn test_no_cross_when_lines_stay_ordered() {
        let above = MacdCross {
            prev_macd_line: 2.0,
            prev_signal_line: 1.0,
            current_macd_line: 3.0,
            current_signal_line: 1.5,
        };
        assert!(!above.is_up_cross());
        assert!(!above.is_down_cross());

        let below = MacdCross {
            prev_macd_line: -2.0,
            prev_signal_line: -1.0,
            current_macd_line: -3.0,
            current_signal_line: -1.5,
        };
        assert!(!below.is_up_cross());
        assert!(!below.is_down_cross());
    }

    #[test]
    fn test_touching_lines_is_no_cross() {
        let touching = MacdCross {
            prev_macd_line: 1.0,
            prev_signal_line: 1.0,
            current_macd_line: 2.0,
            current_signal_line: 1.0,
        };

        assert!(!touching.is_up_cross());
        assert!(!touching.is_down_cross());
    }
}
