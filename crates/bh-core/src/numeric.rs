use crate::BhError;

/// Floating point type of the plant model.
///
/// Single precision throughout: the model is sized for an FPU-equipped
/// microcontroller and the host build reproduces its arithmetic bit for bit.
pub type Real = f32;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-6,
            rel: 1e-5,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, BhError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(BhError::NonFinite {
            what,
            value: f64::from(v),
        })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, BhError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(BhError::NonPositive {
            what,
            value: f64::from(v),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-6,
            rel: 1e-5,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-7, tol));
        assert!(nearly_equal(0.0, 1e-7, tol));
        assert!(!nearly_equal(1.0, 1.001, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(ensure_positive(1e-6, "l").is_ok());
        assert!(matches!(
            ensure_positive(0.0, "l"),
            Err(BhError::NonPositive { what: "l", .. })
        ));
        assert!(ensure_positive(-3.0, "l").is_err());
        assert!(matches!(
            ensure_positive(Real::INFINITY, "l"),
            Err(BhError::NonFinite { .. })
        ));
    }

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e3f32..1e3, b in -1e3f32..1e3) {
            let tol = Tolerances::default();
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
        }

        #[test]
        fn positive_values_pass_through(v in 1e-9f32..1e9) {
            prop_assert_eq!(ensure_positive(v, "v"), Ok(v));
        }
    }
}
