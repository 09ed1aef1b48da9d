//! Internal rate of return of an annual cash-flow schedule
//!
//! Index `t` of a schedule is the amount received (positive) or paid
//! (negative) at the end of year `t`; index 0 is the purchase date. The root is
//! first bracketed on a fixed rate grid, then refined with Newton steps that
//! fall back to bisection whenever a step would leave the bracket.

/// Rates tried, in order, when looking for a sign change in NPV
const BRACKET_GRID: [f64; 12] = [-0.99, -0.5, -0.2, 0.0, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 3.0, 10.0];
const RATE_TOLERANCE: f64 = 1e-12;
const MAX_STEPS: usize = 200;

/// NPV of the schedule at an annual rate
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    present_value_and_slope(cashflows, rate).0
}

/// NPV and dNPV/drate in one pass
fn present_value_and_slope(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let v = 1.0 / (1.0 + rate);
    let mut discount = 1.0;
    let mut npv = 0.0;
    let mut slope = 0.0;

    for (year, &amount) in cashflows.iter().enumerate() {
        npv += amount * discount;
        // d/dr (1+r)^-t = -t (1+r)^-(t+1)
        slope -= year as f64 * amount * discount * v;
        discount *= v;
    }
    (npv, slope)
}

/// First grid interval whose end points straddle a root
fn bracket(cashflows: &[f64]) -> Option<(f64, f64)> {
    let mut previous = (BRACKET_GRID[0], npv_at_rate(cashflows, BRACKET_GRID[0]));
    for &rate in &BRACKET_GRID[1..] {
        let npv = npv_at_rate(cashflows, rate);
        if previous.1 * npv <= 0.0 {
            return Some((previous.0, rate));
        }
        previous = (rate, npv);
    }
    None
}

/// Annual IRR of `cashflows`, or None when the schedule has no sign change or
/// no root lies between -99% and 1000%
pub fn solve_irr(cashflows: &[f64]) -> Option<f64> {
    let scale = cashflows.iter().fold(0.0_f64, |m, cf| m.max(cf.abs()));
    let has_inflow = cashflows.iter().any(|&cf| cf > 0.0);
    let has_outflow = cashflows.iter().any(|&cf| cf < 0.0);
    if scale == 0.0 || !has_inflow || !has_outflow {
        return None;
    }
    let npv_tolerance = scale * 1e-12;

    let (mut low, mut high) = bracket(cashflows)?;
    let npv_low = npv_at_rate(cashflows, low);
    if npv_low.abs() <= npv_tolerance {
        return Some(low);
    }
    let low_sign = npv_low.signum();

    let mut rate = 0.5 * (low + high);
    for _ in 0..MAX_STEPS {
        let (npv, slope) = present_value_and_slope(cashflows, rate);
        if npv.abs() <= npv_tolerance {
            return Some(rate);
        }

        // Keep the root inside [low, high]
        if npv.signum() == low_sign {
            low = rate;
        } else {
            high = rate;
        }

        let newton = if slope != 0.0 { rate - npv / slope } else { f64::NAN };
        let next = if newton > low && newton < high {
            newton
        } else {
            0.5 * (low + high)
        };

        if (next - rate).abs() <= RATE_TOLERANCE {
            return Some(next);
        }
        rate = next;
    }

    log::debug!("IRR did not converge within {} steps, last rate {:.6}", MAX_STEPS, rate);
    Some(rate)
}
