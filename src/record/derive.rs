//! Derivation engine
//!
//! bmi = weight_kg / (height_cm / 100)^2, rounded to two decimals with
//! ties going to the even digit. The verdict buckets the rounded value;
//! each bucket includes its lower edge.
//!
//! Pure functions only. Called once per record construction.

use super::types::Verdict;

/// Lower edge of `normal`.
pub const NORMAL_FROM: f64 = 18.5;
/// Lower edge of `overweight`.
pub const OVERWEIGHT_FROM: f64 = 25.0;
/// Lower edge of `obese`.
pub const OBESE_FROM: f64 = 30.0;

/// Decimal places kept on the ratio.
pub const BMI_DECIMALS: i32 = 2;

/// Values computed from raw fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    pub bmi: f64,
    pub verdict: Verdict,
}

/// Rounds to `decimals` places, ties to even.
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Body-mass ratio from kilograms and centimeters, rounded.
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round_half_even(weight_kg / (height_m * height_m), BMI_DECIMALS)
}

impl Verdict {
    /// Buckets a ratio. Lower edges are inclusive.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < NORMAL_FROM {
            Verdict::Underweight
        } else if bmi < OVERWEIGHT_FROM {
            Verdict::Normal
        } else if bmi < OBESE_FROM {
            Verdict::Overweight
        } else {
            Verdict::Obese
        }
    }
}

/// Computes every derived field.
pub fn derive(weight_kg: f64, height_cm: f64) -> Derived {
    let bmi = body_mass_index(weight_kg, height_cm);
    Derived {
        bmi,
        verdict: Verdict::from_bmi(bmi),
    }
}
