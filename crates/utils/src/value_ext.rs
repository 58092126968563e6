use crate::f;

/// Extends float primitives with formatting and comparison helpers
pub trait ValueExt {
    /// Scientific number formatting with a signed, padded exponent
    ///
    /// The default `{:e}` formatting drops the exponent sign and padding,
    /// which makes columns of eigenvalues and residuals hard to read.
    ///
    /// ```rust
    /// # use moctools_utils::ValueExt;
    /// assert_eq!((-1.0).sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!((1.0e-5).sci(3, 2), "1.000e-05".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;

    /// Magnitude of the difference relative to `reference`
    ///
    /// Falls back to the absolute difference when the reference is zero so
    /// that empty regions never produce `NaN`.
    ///
    /// ```rust
    /// # use moctools_utils::ValueExt;
    /// assert_eq!(1.1_f64.relative_to(1.0), 0.10000000000000009);
    /// assert_eq!(0.5_f64.relative_to(0.0), 0.5);
    /// ```
    fn relative_to(&self, reference: f64) -> f64;
}

impl ValueExt for f64 {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let mut num = f!("{:.precision$e}", self, precision = precision);
        // `{:e}` always contains an 'e', the fallback only guards NaN/inf
        let Some(idx) = num.find('e') else {
            return num;
        };
        let exp = num.split_off(idx);
        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', &exp[1..]),
        };
        num.push_str(&f!("e{}{:0>pad$}", sign, exp, pad = exp_pad));
        num
    }

    fn relative_to(&self, reference: f64) -> f64 {
        if reference == 0.0 {
            (self - reference).abs()
        } else {
            ((self - reference) / reference).abs()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sci_pads_exponent() {
        assert_eq!(1.23456e7.sci(2, 3), "1.23e+007");
        assert_eq!(0.0.sci(1, 2), "0.0e+00");
    }

    #[test]
    fn sci_passes_through_non_finite() {
        assert_eq!(f64::INFINITY.sci(2, 2), "inf");
    }

    #[test]
    fn relative_difference() {
        assert!((2.0_f64.relative_to(4.0) - 0.5).abs() < 1e-15);
        assert_eq!(4.0_f64.relative_to(4.0), 0.0);
    }
}
