//! SOL amount parsing and formatting.
//!
//! Amounts are entered as decimal SOL strings ("1.5") and converted to lamports
//! with integer arithmetic, so "0.1" is exactly 100_000_000 lamports.

use thiserror::Error;

/// Number of lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Fractional digits carried by a lamport amount.
pub const SOL_DECIMALS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("'{0}' is not a decimal number")]
    NotANumber(String),
    #[error("'{0}' is negative")]
    Negative(String),
    #[error("'{0}' exceeds the maximum transferable amount")]
    Overflow(String),
}

/// Parse a decimal SOL amount into lamports.
///
/// The result is `floor(amount * 10^9)`: fractional digits past the ninth are
/// dropped, never rounded up.
pub fn parse_sol_amount(input: &str) -> Result<u64, AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountError::Negative(s.to_string()));
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (s, ""),
    };

    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (int.is_empty() && frac.is_empty()) || !all_digits(int) || !all_digits(frac) {
        return Err(AmountError::NotANumber(s.to_string()));
    }

    let whole: u64 = if int.is_empty() {
        0
    } else {
        int.parse()
            .map_err(|_| AmountError::Overflow(s.to_string()))?
    };

    let frac_truncated = &frac[..frac.len().min(SOL_DECIMALS)];
    let frac_padded = format!("{:0<width$}", frac_truncated, width = SOL_DECIMALS);
    let fraction: u64 = frac_padded
        .parse()
        .map_err(|_| AmountError::NotANumber(s.to_string()))?;

    whole
        .checked_mul(LAMPORTS_PER_SOL)
        .and_then(|l| l.checked_add(fraction))
        .ok_or_else(|| AmountError::Overflow(s.to_string()))
}

/// Format lamports as a SOL string with trailing zeros trimmed.
pub fn format_sol(lamports: u64) -> String {
    let sol = lamports / LAMPORTS_PER_SOL;
    let frac = lamports % LAMPORTS_PER_SOL;
    if frac == 0 {
        return format!("{} SOL", sol);
    }
    let frac = format!("{:09}", frac);
    format!("{}.{} SOL", sol, frac.trim_end_matches('0'))
}
