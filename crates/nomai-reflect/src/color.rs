//! Color space conversion.
//!
//! The remote color type is an enum with one variant per encoding, each
//! carrying four named channels:
//!
//! ```json
//! { "Srgba": { "red": 1.0, "green": 0.5, "blue": 0.0, "alpha": 1.0 } }
//! ```
//!
//! [`convert`] is total over all pairs of spaces: every encoding is routed
//! through linear RGB, using the shortest chain of direct conversions on each
//! side.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ColorError;

/// The ten encodings a color value can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSpace {
    Srgba,
    LinearRgba,
    Hsla,
    Hsva,
    Hwba,
    Laba,
    Lcha,
    Oklaba,
    Oklcha,
    Xyza,
}

impl ColorSpace {
    pub const ALL: [ColorSpace; 10] = [
        ColorSpace::Srgba,
        ColorSpace::LinearRgba,
        ColorSpace::Hsla,
        ColorSpace::Hsva,
        ColorSpace::Hwba,
        ColorSpace::Laba,
        ColorSpace::Lcha,
        ColorSpace::Oklaba,
        ColorSpace::Oklcha,
        ColorSpace::Xyza,
    ];

    /// The variant name used in color values.
    pub fn name(self) -> &'static str {
        match self {
            ColorSpace::Srgba => "Srgba",
            ColorSpace::LinearRgba => "LinearRgba",
            ColorSpace::Hsla => "Hsla",
            ColorSpace::Hsva => "Hsva",
            ColorSpace::Hwba => "Hwba",
            ColorSpace::Laba => "Laba",
            ColorSpace::Lcha => "Lcha",
            ColorSpace::Oklaba => "Oklaba",
            ColorSpace::Oklcha => "Oklcha",
            ColorSpace::Xyza => "Xyza",
        }
    }

    /// Channel names in storage order. Alpha is always last.
    pub fn channels(self) -> [&'static str; 4] {
        match self {
            ColorSpace::Srgba | ColorSpace::LinearRgba => ["red", "green", "blue", "alpha"],
            ColorSpace::Hsla => ["hue", "saturation", "lightness", "alpha"],
            ColorSpace::Hsva => ["hue", "saturation", "value", "alpha"],
            ColorSpace::Hwba => ["hue", "whiteness", "blackness", "alpha"],
            ColorSpace::Laba | ColorSpace::Oklaba => ["lightness", "a", "b", "alpha"],
            ColorSpace::Lcha | ColorSpace::Oklcha => ["lightness", "chroma", "hue", "alpha"],
            ColorSpace::Xyza => ["x", "y", "z", "alpha"],
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorSpace {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorSpace::ALL
            .into_iter()
            .find(|space| space.name() == s)
            .ok_or_else(|| ColorError::UnknownSpace(s.to_owned()))
    }
}

type Channels = [f64; 4];

// ---------------------------------------------------------------------------
// Value plumbing
// ---------------------------------------------------------------------------

/// Split a color value `{Space: channels}` into its space and channel object.
pub fn split(value: &Value) -> Result<(ColorSpace, &Value), ColorError> {
    let map = value.as_object().filter(|map| map.len() == 1).ok_or_else(|| {
        ColorError::UnknownSpace(format!("expected a single-variant color value, got {value}"))
    })?;
    let (name, channels) = map
        .iter()
        .next()
        .ok_or_else(|| ColorError::UnknownSpace(String::new()))?;
    Ok((name.parse()?, channels))
}

/// Wrap a channel object as a color value in `space`.
pub fn wrap(space: ColorSpace, channels: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(space.name().to_owned(), channels);
    Value::Object(map)
}

fn read_channels(value: &Value, space: ColorSpace) -> Result<Channels, ColorError> {
    let map = value.as_object().ok_or_else(|| ColorError::Malformed {
        space,
        details: format!("expected channel object, got {value}"),
    })?;
    let mut out = [0.0; 4];
    for (slot, name) in out.iter_mut().zip(space.channels()) {
        *slot = map
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| ColorError::Malformed {
                space,
                details: format!("missing or non-numeric channel '{name}'"),
            })?;
    }
    Ok(out)
}

fn write_channels(channels: Channels, space: ColorSpace) -> Value {
    let map = space
        .channels()
        .into_iter()
        .zip(channels)
        .map(|(name, v)| (name.to_owned(), Value::from(v)))
        .collect();
    Value::Object(map)
}

/// Convert a channel object from one space to another.
///
/// `value` is the inner channel object (e.g. `{"red": .., "green": ..}`), not
/// the `{Space: ..}` wrapper. Converting to the same space returns the value
/// unchanged.
pub fn convert(value: &Value, from: ColorSpace, to: ColorSpace) -> Result<Value, ColorError> {
    let channels = read_channels(value, from)?;
    if from == to {
        return Ok(value.clone());
    }
    Ok(write_channels(from_linear(to, to_linear(from, channels)), to))
}

/// Convert a whole `{Space: channels}` color value into `to`.
pub fn convert_color(value: &Value, to: ColorSpace) -> Result<Value, ColorError> {
    let (from, channels) = split(value)?;
    Ok(wrap(to, convert(channels, from, to)?))
}

// ---------------------------------------------------------------------------
// Conversion graph
// ---------------------------------------------------------------------------

fn to_linear(space: ColorSpace, c: Channels) -> Channels {
    match space {
        ColorSpace::LinearRgba => c,
        ColorSpace::Srgba => srgba_to_linear(c),
        ColorSpace::Hwba => to_linear(ColorSpace::Srgba, hwba_to_srgba(c)),
        ColorSpace::Hsva => to_linear(ColorSpace::Hwba, hsva_to_hwba(c)),
        ColorSpace::Hsla => to_linear(ColorSpace::Hsva, hsla_to_hsva(c)),
        ColorSpace::Xyza => xyza_to_linear(c),
        ColorSpace::Laba => to_linear(ColorSpace::Xyza, laba_to_xyza(c)),
        ColorSpace::Lcha => to_linear(ColorSpace::Laba, polar_to_lab(c)),
        ColorSpace::Oklaba => oklaba_to_linear(c),
        ColorSpace::Oklcha => to_linear(ColorSpace::Oklaba, polar_to_lab(c)),
    }
}

fn from_linear(space: ColorSpace, c: Channels) -> Channels {
    match space {
        ColorSpace::LinearRgba => c,
        ColorSpace::Srgba => linear_to_srgba(c),
        ColorSpace::Hwba => srgba_to_hwba(from_linear(ColorSpace::Srgba, c)),
        ColorSpace::Hsva => hwba_to_hsva(from_linear(ColorSpace::Hwba, c)),
        ColorSpace::Hsla => hsva_to_hsla(from_linear(ColorSpace::Hsva, c)),
        ColorSpace::Xyza => linear_to_xyza(c),
        ColorSpace::Laba => xyza_to_laba(from_linear(ColorSpace::Xyza, c)),
        ColorSpace::Lcha => lab_to_polar(from_linear(ColorSpace::Laba, c)),
        ColorSpace::Oklaba => linear_to_oklaba(c),
        ColorSpace::Oklcha => lab_to_polar(from_linear(ColorSpace::Oklaba, c)),
    }
}

// -- sRGB transfer --

fn gamma_decode(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn gamma_encode(v: f64) -> f64 {
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn srgba_to_linear([r, g, b, a]: Channels) -> Channels {
    [gamma_decode(r), gamma_decode(g), gamma_decode(b), a]
}

fn linear_to_srgba([r, g, b, a]: Channels) -> Channels {
    [gamma_encode(r), gamma_encode(g), gamma_encode(b), a]
}

// -- cylindrical RGB models --

fn hsla_to_hsva([h, s, l, a]: Channels) -> Channels {
    let v = l + s * l.min(1.0 - l);
    let sv = if v == 0.0 { 0.0 } else { 2.0 * (1.0 - l / v) };
    [h, sv, v, a]
}

fn hsva_to_hsla([h, s, v, a]: Channels) -> Channels {
    let l = v * (1.0 - s / 2.0);
    let sl = if l == 0.0 || l == 1.0 {
        0.0
    } else {
        (v - l) / l.min(1.0 - l)
    };
    [h, sl, l, a]
}

fn hsva_to_hwba([h, s, v, a]: Channels) -> Channels {
    [h, (1.0 - s) * v, 1.0 - v, a]
}

fn hwba_to_hsva([h, w, b, a]: Channels) -> Channels {
    let v = 1.0 - b;
    let s = if v != 0.0 { 1.0 - w / v } else { 0.0 };
    [h, s, v, a]
}

fn hwba_to_srgba([hue, w, blackness, alpha]: Channels) -> Channels {
    let v = 1.0 - blackness;
    let h = hue.rem_euclid(360.0) / 60.0;
    let sector = h.floor();
    let f = h - sector;
    let f = if sector as u8 % 2 == 0 { f } else { 1.0 - f };
    let n = w + f * (v - w);

    let [r, g, b] = match sector as u8 {
        0 => [v, n, w],
        1 => [n, v, w],
        2 => [w, v, n],
        3 => [w, n, v],
        4 => [n, w, v],
        _ => [v, w, n],
    };
    [r, g, b, alpha]
}

fn srgba_to_hwba([r, g, b, a]: Channels) -> Channels {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    let mut hue = if chroma == 0.0 {
        0.0
    } else if r == max {
        60.0 * ((g - b) / chroma)
    } else if g == max {
        60.0 * (2.0 + (b - r) / chroma)
    } else {
        60.0 * (4.0 + (r - g) / chroma)
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    [hue, min, 1.0 - max, a]
}

// -- CIE XYZ / Lab (D65) --

const WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];
const EPSILON: f64 = 0.008856;
const KAPPA: f64 = 903.3;

fn linear_to_xyza([r, g, b, a]: Channels) -> Channels {
    [
        r * 0.4124564 + g * 0.3575761 + b * 0.1804375,
        r * 0.2126729 + g * 0.7151522 + b * 0.072175,
        r * 0.0193339 + g * 0.119192 + b * 0.9503041,
        a,
    ]
}

fn xyza_to_linear([x, y, z, a]: Channels) -> Channels {
    [
        x * 3.2404542 + y * -1.5371385 + z * -0.4985314,
        x * -0.969266 + y * 1.8760108 + z * 0.041556,
        x * 0.0556434 + y * -0.2040259 + z * 1.0572252,
        a,
    ]
}

fn lab_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

fn lab_f_inv(f: f64) -> f64 {
    let cubed = f.powi(3);
    if cubed > EPSILON {
        cubed
    } else {
        (116.0 * f - 16.0) / KAPPA
    }
}

fn xyza_to_laba([x, y, z, alpha]: Channels) -> Channels {
    let fx = lab_f(x / WHITE[0]);
    let fy = lab_f(y / WHITE[1]);
    let fz = lab_f(z / WHITE[2]);
    [1.16 * fy - 0.16, 5.0 * (fx - fy), 2.0 * (fy - fz), alpha]
}

fn laba_to_xyza([lightness, a, b, alpha]: Channels) -> Channels {
    let l = 100.0 * lightness;
    let fy = (l + 16.0) / 116.0;
    let fx = (100.0 * a) / 500.0 + fy;
    let fz = fy - (100.0 * b) / 200.0;

    let yr = if l > EPSILON * KAPPA {
        fy.powi(3)
    } else {
        l / KAPPA
    };
    [
        lab_f_inv(fx) * WHITE[0],
        yr * WHITE[1],
        lab_f_inv(fz) * WHITE[2],
        alpha,
    ]
}

// -- Oklab --

fn linear_to_oklaba([r, g, b, alpha]: Channels) -> Channels {
    let l = (0.4122214708 * r + 0.5363325363 * g + 0.0514459929 * b).cbrt();
    let m = (0.2119034982 * r + 0.6806995451 * g + 0.1073969566 * b).cbrt();
    let s = (0.0883024619 * r + 0.2817188376 * g + 0.6299787005 * b).cbrt();
    [
        0.2104542553 * l + 0.793617785 * m - 0.0040720468 * s,
        1.9779984951 * l - 2.428592205 * m + 0.4505937099 * s,
        0.0259040371 * l + 0.7827717662 * m - 0.808675766 * s,
        alpha,
    ]
}

fn oklaba_to_linear([lightness, a, b, alpha]: Channels) -> Channels {
    let l = (lightness + 0.3963377774 * a + 0.2158037573 * b).powi(3);
    let m = (lightness - 0.1055613458 * a - 0.0638541728 * b).powi(3);
    let s = (lightness - 0.0894841775 * a - 1.291485548 * b).powi(3);
    [
        4.0767416621 * l - 3.3077115913 * m + 0.2309699292 * s,
        -1.2684380046 * l + 2.6097574011 * m - 0.3413193965 * s,
        -0.0041960863 * l - 0.7034186147 * m + 1.707614701 * s,
        alpha,
    ]
}

// -- polar forms of Lab and Oklab --

fn polar_to_lab([lightness, chroma, hue, alpha]: Channels) -> Channels {
    let radians = hue * PI / 180.0;
    [lightness, chroma * radians.cos(), chroma * radians.sin(), alpha]
}

fn lab_to_polar([lightness, a, b, alpha]: Channels) -> Channels {
    let mut hue = b.atan2(a) * 180.0 / PI;
    if hue < 0.0 {
        hue += 360.0;
    }
    [lightness, a.hypot(b), hue, alpha]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn channels_of(value: &Value, space: ColorSpace) -> Channels {
        read_channels(value, space).unwrap()
    }

    fn assert_close(actual: Channels, expected: Channels, tolerance: f64) {
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!(
                (a - e).abs() < tolerance,
                "channel {i}: {a} vs {e} (actual {actual:?}, expected {expected:?})"
            );
        }
    }

    // -- 1. Names --

    #[test]
    fn space_names_round_trip() {
        for space in ColorSpace::ALL {
            assert_eq!(space.name().parse::<ColorSpace>().unwrap(), space);
        }
        assert!(matches!(
            "Cmyk".parse::<ColorSpace>(),
            Err(ColorError::UnknownSpace(_))
        ));
    }

    // -- 2. Known values --

    #[test]
    fn pure_red_from_hsla() {
        let hsla = json!({ "hue": 0.0, "saturation": 1.0, "lightness": 0.5, "alpha": 1.0 });
        let srgba = convert(&hsla, ColorSpace::Hsla, ColorSpace::Srgba).unwrap();
        assert_close(
            channels_of(&srgba, ColorSpace::Srgba),
            [1.0, 0.0, 0.0, 1.0],
            1e-9,
        );
    }

    #[test]
    fn white_in_lab_and_xyz() {
        let white = json!({ "red": 1.0, "green": 1.0, "blue": 1.0, "alpha": 1.0 });
        let laba = convert(&white, ColorSpace::Srgba, ColorSpace::Laba).unwrap();
        assert_close(
            channels_of(&laba, ColorSpace::Laba),
            [1.0, 0.0, 0.0, 1.0],
            1e-3,
        );
        let xyza = convert(&white, ColorSpace::Srgba, ColorSpace::Xyza).unwrap();
        assert_close(
            channels_of(&xyza, ColorSpace::Xyza),
            [0.9505, 1.0, 1.0888, 1.0],
            1e-3,
        );
    }

    #[test]
    fn mid_grey_linearizes() {
        let grey = json!({ "red": 0.5, "green": 0.5, "blue": 0.5, "alpha": 0.25 });
        let linear = convert(&grey, ColorSpace::Srgba, ColorSpace::LinearRgba).unwrap();
        assert_close(
            channels_of(&linear, ColorSpace::LinearRgba),
            [0.21404, 0.21404, 0.21404, 0.25],
            1e-4,
        );
    }

    // -- 3. Totality and round trips --

    #[test]
    fn every_pair_round_trips() {
        let source = json!({ "red": 0.2, "green": 0.4, "blue": 0.6, "alpha": 0.8 });
        for target in ColorSpace::ALL {
            let there = convert(&source, ColorSpace::Srgba, target).unwrap();
            for other in ColorSpace::ALL {
                let hop = convert(&there, target, other).unwrap();
                let back = convert(&hop, other, ColorSpace::Srgba).unwrap();
                assert_close(
                    channels_of(&back, ColorSpace::Srgba),
                    [0.2, 0.4, 0.6, 0.8],
                    1e-4,
                );
            }
        }
    }

    #[test]
    fn same_space_is_identity() {
        let value = json!({ "x": 0.1, "y": 0.2, "z": 0.3, "alpha": 1.0 });
        assert_eq!(convert(&value, ColorSpace::Xyza, ColorSpace::Xyza).unwrap(), value);
    }

    // -- 4. Wrapped values --

    #[test]
    fn convert_whole_color_value() {
        let color = json!({
            "LinearRgba": { "red": 1.0, "green": 1.0, "blue": 1.0, "alpha": 1.0 }
        });
        let converted = convert_color(&color, ColorSpace::Srgba).unwrap();
        let (space, channels) = split(&converted).unwrap();
        assert_eq!(space, ColorSpace::Srgba);
        assert_close(channels_of(channels, space), [1.0, 1.0, 1.0, 1.0], 1e-9);
    }

    #[test]
    fn malformed_channels_are_rejected() {
        let err = convert(&json!({ "red": 1.0 }), ColorSpace::Srgba, ColorSpace::Hsla).unwrap_err();
        assert!(matches!(err, ColorError::Malformed { space: ColorSpace::Srgba, .. }));
        assert!(split(&json!("Red")).is_err());
    }
}
