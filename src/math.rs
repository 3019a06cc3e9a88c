//! Fixed-point arithmetic for Chorus.
//!
//! Runtime values use wad precision (18 decimals). The annual to per-second rate
//! conversion runs once at construction and uses ray precision (27 decimals) for the
//! intermediate power, so the per-block accrual can stay in cheaper wad math.
//!
//! ## Error bound
//! `compound_decay` rounds half-up on every multiplication of the power. With the
//! per-second rate derived from the effective annual rate, one year at 10% nominal
//! lands within 0.02% of a 10% price drop, and one year at 50% nominal within 4%.

use odra::casper_types::U256;

/// 1 wad = 1e18
pub const WAD: u128 = 1_000_000_000_000_000_000;
/// 1 ray = 1e27
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;
/// Conversion factor from wad (18 dec) to ray (27 dec) = 1e9
const WAD_TO_RAY: u128 = 1_000_000_000;

/// Seconds per year (365 days)
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Arithmetic failure in fixed-point math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    Overflow,
    DivisionByZero,
}

/// One wad as `U256`.
pub fn wad() -> U256 {
    U256::from(WAD)
}

/// `a * b / denominator`, rounded down.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    a.checked_mul(b)
        .map(|product| product / denominator)
        .ok_or(MathError::Overflow)
}

/// `a * b / unit`, rounded half-up.
fn mul_round(a: U256, b: U256, unit: U256) -> Result<U256, MathError> {
    a.checked_mul(b)
        .and_then(|product| product.checked_add(unit / U256::from(2u8)))
        .map(|product| product / unit)
        .ok_or(MathError::Overflow)
}

/// `base ^ exponent` where `base` and the result are fixed point in `unit`.
///
/// Exponentiation by squaring: `O(log exponent)` multiplications.
pub fn rpow(base: U256, exponent: u64, unit: U256) -> Result<U256, MathError> {
    if unit.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let mut result = unit;
    let mut square = base;
    let mut remaining = exponent;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = mul_round(result, square, unit)?;
        }
        remaining >>= 1;
        if remaining > 0 {
            square = mul_round(square, square, unit)?;
        }
    }
    Ok(result)
}

/// `principal / (1 + rate_per_second) ^ seconds_elapsed` in wad.
///
/// Returns `principal` unchanged when no time has elapsed or the rate is zero.
pub fn compound_decay(
    principal: U256,
    rate_per_second: U256,
    seconds_elapsed: u64,
) -> Result<U256, MathError> {
    if seconds_elapsed == 0 || rate_per_second.is_zero() {
        return Ok(principal);
    }
    let base = wad()
        .checked_add(rate_per_second)
        .ok_or(MathError::Overflow)?;
    let growth = rpow(base, seconds_elapsed, wad())?;
    mul_div(principal, wad(), growth)
}

/// Lowest token price the decay may reach (1e-9 of a collateral unit per Note).
///
/// Interest is `supply * (old / new - 1)` rounded down, so the price must stay far
/// enough above zero for that quotient to be both defined and accurate.
pub const MIN_TOKEN_PRICE: u128 = 1_000_000_000;

/// [`compound_decay`] clamped to `floor`.
///
/// A principal already at or below the floor is returned unchanged. A growth factor
/// too large for U256 means the price has long passed the floor.
pub fn compound_decay_floored(
    principal: U256,
    rate_per_second: U256,
    seconds_elapsed: u64,
    floor: U256,
) -> Result<U256, MathError> {
    if principal <= floor {
        return Ok(principal);
    }
    match compound_decay(principal, rate_per_second, seconds_elapsed) {
        Ok(price) => Ok(price.max(floor)),
        Err(MathError::Overflow) => Ok(floor),
        Err(err) => Err(err),
    }
}

/// Effective annual rate of a nominal annual rate compounded every second:
/// `(1 + nominal / SECONDS_PER_YEAR) ^ SECONDS_PER_YEAR - 1`.
///
/// Input and output are wad; the power itself is taken in ray.
pub fn nominal_to_effective_annual_rate(nominal: U256) -> Result<U256, MathError> {
    let ray = U256::from(RAY);
    let per_second = nominal
        .checked_mul(U256::from(WAD_TO_RAY))
        .ok_or(MathError::Overflow)?
        / U256::from(SECONDS_PER_YEAR);
    let base = ray.checked_add(per_second).ok_or(MathError::Overflow)?;
    let compounded = rpow(base, SECONDS_PER_YEAR, ray)?;
    let effective_ray = compounded - ray;
    Ok((effective_ray + U256::from(WAD_TO_RAY / 2)) / U256::from(WAD_TO_RAY))
}

/// Per-second rate applied to the token price for an effective annual rate.
pub fn effective_rate_per_second(effective_annual: U256) -> U256 {
    effective_annual / U256::from(SECONDS_PER_YEAR)
}

/// Per-second rate for a nominal annual rate (wad in, wad out).
pub fn nominal_to_effective_rate(nominal: U256) -> Result<U256, MathError> {
    nominal_to_effective_annual_rate(nominal).map(effective_rate_per_second)
}

/// Notes owed to keep `supply * price` constant when the price moves from
/// `old_price` to `new_price`: `supply * (old_price / new_price - 1)`.
pub fn accrued_interest(
    supply: U256,
    old_price: U256,
    new_price: U256,
) -> Result<U256, MathError> {
    let grown = mul_div(supply, old_price, new_price)?;
    Ok(grown.saturating_sub(supply))
}
