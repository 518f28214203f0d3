//! Text encodings for polar point lists.
//!
//! | code | name | theta | encoding |
//! |------|------|-------|----------|
//! | 0 | default | wrapped to `[0, 3600)` | `{r,theta}` pairs, comma-joined |
//! | 1 | single byte | wrapped | `{r,theta}` scaled to `0..=255`, comma-joined |
//! | 2 | theta-rho | continuous | `theta_rad rho` lines, 5 decimals |
//! | 3 | whitespace | wrapped | two 8-bit binary strings per line, `0` as space and `1` as tab |
//!
//! Unrecognized codes render as an empty string.

use std::f64::consts::PI;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::polar::MAX_RADIUS;
use crate::types::PolarPoint;

/// Tenths of a degree in a full turn.
const FULL_TURN_TENTHS: f64 = 3600.0;

/// Quarter turn subtracted for theta-rho output so 0 points up.
const QUARTER_TURN_TENTHS: f64 = 900.0;

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `{r,theta}` with integer radius and wrapped theta.
    Default,
    /// `{r,theta}` each scaled to a single byte.
    SingleByte,
    /// One `theta rho` line per point, theta continuous in radians.
    ThetaRho,
    /// Single-byte values as binary strings of spaces and tabs.
    Whitespace,
}

impl OutputFormat {
    /// Map a numeric format code to a format.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Default),
            1 => Some(Self::SingleByte),
            2 => Some(Self::ThetaRho),
            3 => Some(Self::Whitespace),
            _ => None,
        }
    }

    /// The numeric code of this format.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::SingleByte => 1,
            Self::ThetaRho => 2,
            Self::Whitespace => 3,
        }
    }

    /// Render `points` in this format.
    #[must_use]
    pub fn format(self, points: &[PolarPoint]) -> String {
        let mut out = String::new();
        for (i, p) in points.iter().enumerate() {
            match self {
                Self::Default => {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(
                        out,
                        "{{{:.0},{:.0}}}",
                        p.r.round(),
                        wrapped_theta(p.theta).round()
                    );
                }
                Self::SingleByte => {
                    if i > 0 {
                        out.push(',');
                    }
                    let (r, theta) = byte_pair(p);
                    let _ = write!(out, "{{{r},{theta}}}");
                }
                Self::ThetaRho => {
                    if i > 0 {
                        out.push('\n');
                    }
                    // Adding 0.0 turns -0.0 into 0.0.
                    let theta = -(p.theta - QUARTER_TURN_TENTHS) * PI / 1800.0 + 0.0;
                    let rho = p.r / MAX_RADIUS + 0.0;
                    let _ = write!(out, "{theta:.5} {rho:.5}");
                }
                Self::Whitespace => {
                    if i > 0 {
                        out.push('\n');
                    }
                    let (r, theta) = byte_pair(p);
                    out.push_str(&whitespace_byte(r));
                    out.push_str(&whitespace_byte(theta));
                }
            }
        }
        out
    }
}

/// Theta reduced to `[0, 3600)` tenths of a degree.
fn wrapped_theta(theta: f64) -> f64 {
    // -0.0 survives rem_euclid; adding 0.0 clears the sign.
    theta.rem_euclid(FULL_TURN_TENTHS) + 0.0
}

/// Radius and wrapped theta each scaled to `0..=255`.
fn byte_pair(p: &PolarPoint) -> (u8, u8) {
    (
        to_byte(255.0 * p.r / MAX_RADIUS),
        to_byte(255.0 * wrapped_theta(p.theta) / FULL_TURN_TENTHS),
    )
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Eight binary digits with `0` as a space and `1` as a tab.
fn whitespace_byte(value: u8) -> String {
    format!("{value:08b}")
        .chars()
        .map(|c| if c == '1' { '\t' } else { ' ' })
        .collect()
}

/// Render `points` using a numeric format code.
///
/// Unrecognized codes produce an empty string.
#[must_use]
pub fn format_points(points: &[PolarPoint], code: u8) -> String {
    OutputFormat::from_code(code).map_or_else(String::new, |format| format.format(points))
}

/// Parse default-format text (`{r,theta},{r,theta},...`) back into points.
///
/// Parsing is permissive: pairs whose values are missing or not finite
/// numbers are skipped. An empty value counts as missing, not as zero, so
/// `{,5}` is dropped rather than read as `(0, 5)`.
#[must_use]
pub fn parse_default(text: &str) -> Vec<PolarPoint> {
    let text = text.trim();
    let text = text.strip_prefix('{').unwrap_or(text);
    let text = text.strip_suffix('}').unwrap_or(text);

    text.split("},{")
        .filter_map(|pair| {
            let mut values = pair.split(',').map(|v| v.trim().parse::<f64>().ok());
            let r = values.next().flatten().filter(|v| v.is_finite())?;
            let theta = values.next().flatten().filter(|v| v.is_finite())?;
            Some(PolarPoint::new(r, theta))
        })
        .collect()
}
