//! Color schemes and multi-stop interpolation engine.

use std::fmt;
use std::str::FromStr;

use csvgrid_core::Error;

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Available color schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    /// Perceptually uniform purple -> green -> yellow
    #[default]
    Viridis,
    /// Blue -> Cyan -> Yellow -> Red
    Jet,
    /// Black -> White
    Grayscale,
    /// Black -> Red, the classic single-channel intensity ramp
    Red,
    /// Blue -> White -> Red (anomalies, signed fields)
    BlueWhiteRed,
    /// Purple -> Blue -> Green -> Yellow -> Red (temperature maps)
    Temperature,
}

impl ColorScheme {
    pub const ALL: &[ColorScheme] = &[
        Self::Viridis,
        Self::Jet,
        Self::Grayscale,
        Self::Red,
        Self::BlueWhiteRed,
        Self::Temperature,
    ];

    /// Name accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Viridis => "viridis",
            Self::Jet => "jet",
            Self::Grayscale => "grayscale",
            Self::Red => "red",
            Self::BlueWhiteRed => "blue-white-red",
            Self::Temperature => "temperature",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name() == wanted || (wanted == "gray" && *scheme == Self::Grayscale))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(ColorScheme::name).collect();
                Error::invalid("scheme", s, format!("expected one of {}", known.join(", ")))
            })
    }
}

// ─── Color stop definitions ───────────────────────────────────────────

const VIRIDIS_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 68, 1, 84),
    ColorStop::new(0.25, 59, 82, 139),
    ColorStop::new(0.50, 33, 145, 140),
    ColorStop::new(0.75, 94, 201, 98),
    ColorStop::new(1.00, 253, 231, 37),
];

const JET_STOPS: &[ColorStop] = &[
    ColorStop::new(0.000, 0, 0, 143),
    ColorStop::new(0.125, 0, 0, 255),
    ColorStop::new(0.375, 0, 255, 255),
    ColorStop::new(0.625, 255, 255, 0),
    ColorStop::new(0.875, 255, 0, 0),
    ColorStop::new(1.000, 128, 0, 0),
];

const BLUE_WHITE_RED_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 33, 102, 172),
    ColorStop::new(0.25, 103, 169, 207),
    ColorStop::new(0.50, 247, 247, 247),
    ColorStop::new(0.75, 239, 138, 98),
    ColorStop::new(1.00, 178, 24, 43),
];

const TEMPERATURE_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 94, 60, 153),
    ColorStop::new(0.20, 50, 136, 189),
    ColorStop::new(0.40, 102, 194, 165),
    ColorStop::new(0.60, 254, 224, 139),
    ColorStop::new(0.80, 244, 109, 67),
    ColorStop::new(1.00, 158, 1, 66),
];

// ─── Interpolation engine ──────────────────────────────────────────────

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    let last = stops[stops.len() - 1];
    if t.is_nan() || t <= stops[0].t {
        return stops[0].color;
    }
    if t >= last.t {
        return last.color;
    }
    stops
        .windows(2)
        .find(|pair| t <= pair[1].t)
        .map(|pair| {
            let ratio = (t - pair[0].t) / (pair[1].t - pair[0].t);
            lerp_color(pair[0].color, pair[1].color, ratio)
        })
        .unwrap_or(last.color)
}

fn ramp(t: f64) -> u8 {
    (t.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Evaluate a color scheme at normalized position `t` ∈ [0, 1].
/// Positions outside the range clamp to the end colors.
pub fn evaluate(scheme: ColorScheme, t: f64) -> Rgb {
    match scheme {
        ColorScheme::Viridis => multi_stop(VIRIDIS_STOPS, t),
        ColorScheme::Jet => multi_stop(JET_STOPS, t),
        ColorScheme::Grayscale => {
            let v = ramp(t);
            Rgb::new(v, v, v)
        }
        ColorScheme::Red => Rgb::new(ramp(t), 0, 0),
        ColorScheme::BlueWhiteRed => multi_stop(BLUE_WHITE_RED_STOPS, t),
        ColorScheme::Temperature => multi_stop(TEMPERATURE_STOPS, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viridis_endpoints() {
        assert_eq!(evaluate(ColorScheme::Viridis, 0.0), Rgb::new(68, 1, 84));
        assert_eq!(evaluate(ColorScheme::Viridis, 1.0), Rgb::new(253, 231, 37));
    }

    #[test]
    fn grayscale_midpoint() {
        assert_eq!(evaluate(ColorScheme::Grayscale, 0.5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn red_ramp_has_one_channel() {
        let c = evaluate(ColorScheme::Red, 0.25);
        assert_eq!(c, Rgb::new(64, 0, 0));
    }

    #[test]
    fn jet_interpolates_between_stops() {
        // halfway between cyan (0.375) and yellow (0.625)
        let c = evaluate(ColorScheme::Jet, 0.5);
        assert_eq!(c, Rgb::new(128, 255, 128));
    }

    #[test]
    fn out_of_range_clamps() {
        assert_eq!(
            evaluate(ColorScheme::BlueWhiteRed, -0.5),
            Rgb::new(33, 102, 172)
        );
        assert_eq!(
            evaluate(ColorScheme::BlueWhiteRed, 1.5),
            Rgb::new(178, 24, 43)
        );
        assert_eq!(evaluate(ColorScheme::Temperature, f64::NAN), Rgb::new(94, 60, 153));
    }

    #[test]
    fn names_round_trip() {
        for &scheme in ColorScheme::ALL {
            assert_eq!(scheme.name().parse::<ColorScheme>().unwrap(), scheme);
        }
        assert_eq!("Gray".parse::<ColorScheme>().unwrap(), ColorScheme::Grayscale);
        assert!(matches!(
            "rainbow".parse::<ColorScheme>(),
            Err(Error::InvalidParameter { name: "scheme", .. })
        ));
    }
}
