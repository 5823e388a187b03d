use super::{Result, RubyError};

/// Splits `total` into `parts` shares as evenly as possible.
///
/// Every share is `total / parts`; the first `total % parts` shares get one
/// extra unit, so the result is non-increasing and always sums to `total`.
pub fn distribute(total: u32, parts: usize) -> Result<Vec<u32>> {
    if parts == 0 {
        return Err(RubyError::InvalidDistribution { total });
    }
    // Durations are u32, so any part count above u32::MAX only adds zeros.
    let divisor = u32::try_from(parts).unwrap_or(u32::MAX);
    let base = total / divisor;
    let remainder = (total % divisor) as usize;
    Ok((0..parts)
        .map(|idx| if idx < remainder { base + 1 } else { base })
        .collect())
}
