//! Ratio/percentage normalization for country traffic shares.
//!
//! Upstream is asked for a fraction in `[0, 1]` but sometimes answers with a
//! whole-number percentage (`18.5` meaning 18.5%). Values above 1 are taken as
//! percentages already; everything else is scaled by 100. A genuine 1% sent as
//! `1` and a 100% sent as `1.0` cannot be told apart under this rule.

/// Canonical percentage for a raw share value, never negative.
pub fn share_percent(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    let percent = if raw > 1.0 { raw } else { raw * 100.0 };
    percent.max(0.0)
}

/// Width of a proportional bar, in percent of the available space.
pub fn bar_width(raw: f64) -> f64 {
    share_percent(raw).min(100.0)
}

pub fn format_share(raw: f64) -> String {
    format!("{:.2}%", share_percent(raw))
}
