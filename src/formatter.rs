//! Numeric field formatting the standard asks for and `format!`
//! does not provide directly.

/// Formats a float the way C's `%W.PE` does: one integer digit,
/// `precision` fractional digits, and a sign + two digit exponent,
/// right aligned in `width` columns.
pub(crate) fn fmt_exponent(value: f64, width: usize, precision: usize) -> String {
    let body = format!("{:.*E}", precision, value);
    let (mantissa, exponent) = body.split_once('E').unwrap_or((body.as_str(), "0"));
    let exponent = exponent.parse::<i32>().unwrap_or(0);
    format!("{:>width$}", format!("{}E{:+03}", mantissa, exponent), width = width)
}
