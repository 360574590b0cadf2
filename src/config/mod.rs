//! Configuration files.
//!
//! Quantities are written with their units, as strings (`"600 mm"`), and
//! parsed by `uom`: TOML has no notion of units and a bare number would
//! silently be interpreted in the base unit.

pub mod fdk;

pub(crate) fn deserialize_uom<'d, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    String::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

pub(crate) fn deserialize_uom_2d_opt<'d, D, T>(deserializer: D) -> Result<Option<(T, T)>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<(String, String)>::deserialize(deserializer)?
        .map(parse_pair)
        .transpose()
        .map_err(de::Error::custom)
}

pub(crate) fn deserialize_uom_2d<'d, D, T>(deserializer: D) -> Result<(T, T), D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    parse_pair(<(String, String)>::deserialize(deserializer)?)
        .map_err(de::Error::custom)
}

pub(crate) fn deserialize_uom_3d_opt<'d, D, T>(deserializer: D) -> Result<Option<(T, T, T)>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<(String, String, String)>::deserialize(deserializer)?
        .map(|(x,y,z)| tr_tup_res((x.parse(), y.parse(), z.parse())))
        .transpose()
        .map_err(de::Error::custom)
}

pub(crate) fn deserialize_uom_3d<'d, D, T>(deserializer: D) -> Result<(T, T, T), D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let (x, y, z) = <(String, String, String)>::deserialize(deserializer)?;
    tr_tup_res((x.parse(), y.parse(), z.parse()))
        .map_err(de::Error::custom)
}

/// Angles may be written in `deg` as well as in the units known to `uom`
pub(crate) fn deserialize_angle<'d, D>(deserializer: D) -> Result<Angle, D::Error>
where
    D: Deserializer<'d>,
{
    parse_angle(&String::deserialize(deserializer)?).map_err(de::Error::custom)
}

pub(crate) fn parse_angle(s: &str) -> Result<Angle, String> {
    let s = s.trim();
    match s.strip_suffix("deg") {
        Some(value) => value.trim().parse::<f32>().map(deg).map_err(|e| format!("bad angle `{s}`: {e}")),
        None        => s.parse::<Angle>()                  .map_err(|e| format!("bad angle `{s}`: {e}")),
    }
}

fn parse_pair<T: FromStr>((x, y): (String, String)) -> Result<(T, T), T::Err> {
    Ok((x.parse()?, y.parse()?))
}

/// Transpose 3-tuple of `Result`
///
/// `Ok` if all elements `Ok`; if any element is an `Err` return the first one.
///
/// # Examples
/// `(Ok(a),  Ok(b),  Ok(c)) -> Ok((a, b, c))`
/// `(Ok(a), Err(b),  Ok(c)) -> Err(b)`
/// `(Ok(a), Err(b), Err(c)) -> Err(b)`
fn tr_tup_res<A, B, C, E>((x,y,z): (Result<A, E>, Result<B, E>, Result<C, E>)) -> Result<(A, B, C), E> {
    Ok((x?, y?, z?))
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

use units::{Angle, deg};

#[cfg(test)]
mod tests {
    use super::*;
    use units::{Length, mm, cm, radian};

    // uom types are, by default, deserialized from TOML numbers, with the
    // Quantity's base unit being inferred!
    #[test]
    fn toml_uom_without_units() {
        #[derive(Deserialize, Debug)]
        struct X { a: Length }
        let x: X = toml::from_str("a = 2").unwrap();
        assert_eq!(x.a, mm(2.0)); // NOTE: no `mm` in input
    }

    // This defeats the point of uom, so quantities are parsed from strings
    #[test]
    fn toml_uom_with_units() {
        #[derive(Deserialize, Debug)]
        struct X {
            #[serde(deserialize_with = "deserialize_uom")]
            a: Length,
            #[serde(default)]
            #[serde(deserialize_with = "deserialize_uom_3d_opt")]
            b: Option<(Length, Length, Length)>,
        }
        let x: X = toml::from_str(r#"a = "3 cm""#).unwrap();
        assert_eq!(x.a, cm(3.0));
        assert_eq!(x.b, None);
        let x: X = toml::from_str(r#"
            a = "3 mm"
            b = ["1 mm", "2 mm", "3 cm"]
        "#).unwrap();
        assert_eq!(x.b, Some((mm(1.0), mm(2.0), cm(3.0))));
    }

    #[test]
    fn missing_units_are_an_error() {
        #[derive(Deserialize, Debug)]
        struct X {
            #[serde(deserialize_with = "deserialize_uom_2d")]
            a: (Length, Length),
        }
        assert!(toml::from_str::<X>(r#"a = ["3 mm", "4"]"#).is_err());
        assert!(toml::from_str::<X>(r#"a = ["3 mm", "4 mm"]"#).is_ok());
    }

    #[test]
    fn angles_in_degrees_or_radians() {
        assert_eq!(parse_angle("90 deg").unwrap(), deg(90.0));
        assert_eq!(parse_angle(" 2 rad ").unwrap(), radian(2.0));
        assert!(parse_angle("2 furlongs").is_err());
    }

    #[test]
    fn first_error_wins() {
        let r: Result<(u8, u8, u8), &str> = tr_tup_res((Ok(1), Err("b"), Err("c")));
        assert_eq!(r, Err("b"));
    }
}
