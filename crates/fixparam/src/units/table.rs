//! Table-driven [`UnitSystem`].
//!
//! Every named unit is stored with its scale to base units and its
//! dimension exponents. Expressions are products of factors, with `/`
//! moving everything after it into the denominator:
//!
//! ```text
//! km/s/Mpc        -> km s^-1 Mpc^-1
//! kg m**2 / s2    -> kg m^2 s^-2
//! 1000 m          -> 1000 m
//! ```

use super::{dims, Dimensions, Equivalency, Unit, UnitSystem};
use crate::config::{FixparamConfig, UnitDef};
use crate::error::UnitError;
use std::collections::BTreeMap;

const PREFIXES: &[(&str, f64)] = &[
    ("Y", 1e24),
    ("Z", 1e21),
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("da", 1e1),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
];

#[derive(Debug, Clone)]
struct UnitEntry {
    scale: f64,
    dims: Dimensions,
    prefixable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    units: BTreeMap<String, UnitEntry>,
}

impl UnitTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// SI base units plus the derived and astronomical units cosmology needs.
    pub fn standard() -> Self {
        use std::f64::consts::PI;

        let mut table = Self::new();
        table.insert("m", 1.0, &[("length", 1)], true);
        table.insert("s", 1.0, &[("time", 1)], true);
        table.insert("g", 1e-3, &[("mass", 1)], true);
        table.insert("K", 1.0, &[("temperature", 1)], true);
        table.insert("A", 1.0, &[("current", 1)], true);
        table.insert("mol", 1.0, &[("amount", 1)], true);
        table.insert("rad", 1.0, &[("angle", 1)], true);

        table.insert("Hz", 1.0, &[("time", -1)], true);
        table.insert("N", 1.0, &[("mass", 1), ("length", 1), ("time", -2)], true);
        table.insert("J", 1.0, &[("mass", 1), ("length", 2), ("time", -2)], true);
        table.insert("W", 1.0, &[("mass", 1), ("length", 2), ("time", -3)], true);
        table.insert("eV", 1.602_176_634e-19, &[("mass", 1), ("length", 2), ("time", -2)], true);
        table.insert("erg", 1e-7, &[("mass", 1), ("length", 2), ("time", -2)], false);

        table.insert("deg", PI / 180.0, &[("angle", 1)], false);
        table.insert("arcmin", PI / 10_800.0, &[("angle", 1)], false);
        table.insert("arcsec", PI / 648_000.0, &[("angle", 1)], false);

        table.insert("min", 60.0, &[("time", 1)], false);
        table.insert("h", 3_600.0, &[("time", 1)], false);
        table.insert("d", 86_400.0, &[("time", 1)], false);
        table.insert("yr", 31_557_600.0, &[("time", 1)], true);

        table.insert("Angstrom", 1e-10, &[("length", 1)], false);
        table.insert("AU", 1.495_978_707e11, &[("length", 1)], false);
        table.insert("lyr", 9.460_730_472_580_8e15, &[("length", 1)], false);
        table.insert("pc", 3.085_677_581_491_367e16, &[("length", 1)], true);
        table.insert("solMass", 1.988_409_870_698_051e30, &[("mass", 1)], false);

        table
    }

    /// The standard table extended with the units defined in `config`.
    pub fn standard_with(config: &FixparamConfig) -> Result<Self, UnitError> {
        let mut table = Self::standard();
        for def in &config.units {
            table.define_from(def)?;
        }
        Ok(table)
    }

    fn insert(&mut self, symbol: &str, scale: f64, pairs: &[(&str, i32)], prefixable: bool) {
        self.units.insert(
            symbol.to_string(),
            UnitEntry {
                scale,
                dims: dims(pairs),
                prefixable,
            },
        );
    }

    /// Add a new base unit measuring its own dimension.
    pub fn base(&mut self, symbol: &str, dimension: &str, prefixable: bool) -> &mut Self {
        self.insert(symbol, 1.0, &[(dimension, 1)], prefixable);
        self
    }

    /// Define `symbol` as `factor` times the unit expression `expr`.
    pub fn define(
        &mut self,
        symbol: &str,
        factor: f64,
        expr: &str,
        prefixable: bool,
    ) -> Result<&mut Self, UnitError> {
        let factor = check_factor(factor, expr)?;
        let parsed = self.parse_unit(expr)?;
        tracing::debug!(symbol, expr, factor, "defining unit");
        self.units.insert(
            symbol.to_string(),
            UnitEntry {
                scale: factor * parsed.scale(),
                dims: parsed.dimensions().clone(),
                prefixable,
            },
        );
        Ok(self)
    }

    fn define_from(&mut self, def: &UnitDef) -> Result<&mut Self, UnitError> {
        let definition = def.definition.trim();
        let (factor, expr) = match definition.split_once(char::is_whitespace) {
            Some((head, rest)) => match head.parse::<f64>() {
                Ok(factor) => (factor, rest),
                Err(_) => (1.0, definition),
            },
            None => match definition.parse::<f64>() {
                Ok(factor) => (factor, ""),
                Err(_) => (1.0, definition),
            },
        };
        self.define(&def.symbol, factor, expr, def.prefixable)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.lookup(symbol).is_some()
    }

    fn lookup(&self, symbol: &str) -> Option<(f64, &Dimensions)> {
        if let Some(entry) = self.units.get(symbol) {
            return Some((entry.scale, &entry.dims));
        }
        PREFIXES.iter().find_map(|(prefix, factor)| {
            let rest = symbol.strip_prefix(*prefix)?;
            let entry = self.units.get(rest).filter(|e| e.prefixable)?;
            Some((factor * entry.scale, &entry.dims))
        })
    }
}

/// Split a factor such as `s-1`, `m^2` or `Mpc` into symbol and power.
fn split_power(factor: &str, spec: &str) -> Result<(String, i32), UnitError> {
    let malformed = |reason: &str| UnitError::Malformed {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    if let Some((symbol, power)) = factor.split_once('^') {
        let power = power
            .parse::<i32>()
            .map_err(|_| malformed("invalid power"))?;
        if symbol.is_empty() {
            return Err(malformed("power without a unit"));
        }
        return Ok((symbol.to_string(), power));
    }

    let digits = factor
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    let Some(mut start) = digits else {
        return Ok((factor.to_string(), 1));
    };
    if start > 0 && factor[..start].ends_with(|c: char| c == '-' || c == '+') {
        start -= 1;
    }
    if start == 0 {
        return Err(malformed("power without a unit"));
    }
    let power = factor[start..]
        .parse::<i32>()
        .map_err(|_| malformed("invalid power"))?;
    Ok((factor[..start].to_string(), power))
}

/// Rewrite grouped powers such as `s^(-1)` as `s^-1`, so the remaining
/// parentheses only ever group factors.
fn inline_powers(expr: &str, spec: &str) -> Result<String, UnitError> {
    let mut out = String::with_capacity(expr.len());
    let mut rest = expr;
    while let Some(at) = rest.find("^(") {
        out.push_str(&rest[..=at]);
        let group = &rest[at + 2..];
        let close = group.find(')').ok_or_else(|| UnitError::Malformed {
            spec: spec.to_string(),
            reason: "unbalanced parentheses".into(),
        })?;
        let power = group[..close].trim();
        if power.parse::<i32>().is_err() {
            return Err(UnitError::Malformed {
                spec: spec.to_string(),
                reason: "invalid power".into(),
            });
        }
        out.push_str(power);
        rest = &group[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Numeric factors must be finite and non-zero.
fn check_factor(factor: f64, spec: &str) -> Result<f64, UnitError> {
    if factor.is_finite() && factor != 0.0 {
        Ok(factor)
    } else {
        Err(UnitError::Malformed {
            spec: spec.to_string(),
            reason: format!("invalid scale factor {factor}"),
        })
    }
}

fn render(scale_factor: f64, factors: &[(String, i32)]) -> String {
    let mut parts = Vec::with_capacity(factors.len() + 1);
    if scale_factor != 1.0 {
        parts.push(format!("{scale_factor}"));
    }
    for (symbol, power) in factors {
        if *power == 1 {
            parts.push(symbol.clone());
        } else {
            parts.push(format!("{symbol}^{power}"));
        }
    }
    parts.join(" ")
}

impl UnitSystem for UnitTable {
    fn parse_unit(&self, spec: &str) -> Result<Unit, UnitError> {
        let trimmed = spec.trim();
        if trimmed.is_empty() || trimmed == "dimensionless" {
            return Ok(Unit::dimensionless());
        }
        if trimmed.matches('(').count() != trimmed.matches(')').count() {
            return Err(UnitError::Malformed {
                spec: spec.to_string(),
                reason: "unbalanced parentheses".into(),
            });
        }

        let normalized = inline_powers(&trimmed.replace("**", "^"), spec)?;
        let mut scale = 1.0;
        let mut numeric = 1.0;
        let mut dimensions = Dimensions::new();
        let mut factors: Vec<(String, i32)> = Vec::new();

        for (index, segment) in normalized.split('/').enumerate() {
            let sign = if index == 0 { 1 } else { -1 };
            let segment = segment.replace(|c: char| c == '(' || c == ')', " ");
            let mut empty = true;

            for factor in segment.split(|c: char| c.is_whitespace() || c == '*') {
                if factor.is_empty() {
                    continue;
                }
                empty = false;

                if let Ok(number) = factor.parse::<f64>() {
                    let number = check_factor(number, spec)?.powi(sign);
                    numeric *= number;
                    scale *= number;
                    continue;
                }

                let (symbol, power) = split_power(factor, spec)?;
                let power = power * sign;
                let (unit_scale, unit_dims) = self
                    .lookup(&symbol)
                    .ok_or_else(|| UnitError::UnknownUnit(symbol.clone()))?;

                scale *= unit_scale.powi(power);
                for (dim, exp) in unit_dims {
                    *dimensions.entry(dim.clone()).or_insert(0) += exp * power;
                }
                match factors.iter_mut().find(|(s, _)| *s == symbol) {
                    Some((_, existing)) => *existing += power,
                    None => factors.push((symbol, power)),
                }
            }

            if empty && index > 0 {
                return Err(UnitError::Malformed {
                    spec: spec.to_string(),
                    reason: "empty denominator".into(),
                });
            }
        }

        dimensions.retain(|_, exp| *exp != 0);
        factors.retain(|(_, power)| *power != 0);

        Ok(Unit::from_parts(render(numeric, &factors), scale, dimensions))
    }

    fn convert(
        &self,
        value: f64,
        from: &Unit,
        to: &Unit,
        equivalencies: &[Equivalency],
    ) -> Result<f64, UnitError> {
        if from.is_equivalent(to) {
            return Ok(value * from.scale() / to.scale());
        }
        equivalencies
            .iter()
            .find_map(|eq| eq.apply(value, from, to))
            .ok_or_else(|| UnitError::Incompatible {
                from: from.symbol().to_string(),
                to: to.symbol().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        ((a - b) / b).abs() < 1e-12
    }

    #[test]
    fn parses_simple_unit() {
        let table = UnitTable::standard();
        let km = table.parse_unit("km").unwrap();
        assert_eq!(km, "km");
        assert_eq!(km.scale(), 1e3);
        assert_eq!(km.dimensions(), &dims(&[("length", 1)]));
    }

    #[test]
    fn parses_hubble_unit() {
        let table = UnitTable::standard();
        let unit = table.parse_unit("km/s/Mpc").unwrap();
        assert_eq!(unit.symbol(), "km s^-1 Mpc^-1");
        assert_eq!(unit.dimensions(), &dims(&[("time", -1)]));
        assert!(approx(unit.scale(), 1e3 / 3.085_677_581_491_367e22));
    }

    #[test]
    fn canonical_symbol_parses_back_to_same_unit() {
        let table = UnitTable::standard();
        let unit = table.parse_unit("km/s/Mpc").unwrap();
        let again = table.parse_unit(unit.symbol()).unwrap();
        assert_eq!(unit, again);
    }

    #[test]
    fn parses_power_notations() {
        let table = UnitTable::standard();
        let caret = table.parse_unit("m s^-2").unwrap();
        let suffix = table.parse_unit("m s-2").unwrap();
        let stars = table.parse_unit("m / s**2").unwrap();
        assert_eq!(caret, suffix);
        assert_eq!(caret, stars);
        assert_eq!(caret.symbol(), "m s^-2");
    }

    #[test]
    fn parenthesized_denominator() {
        let table = UnitTable::standard();
        let unit = table.parse_unit("km / (s Mpc)").unwrap();
        assert_eq!(unit.symbol(), "km s^-1 Mpc^-1");
    }

    #[test]
    fn parses_parenthesized_power() {
        let table = UnitTable::standard();
        let grouped = table.parse_unit("s^(-1)").unwrap();
        assert_eq!(grouped, table.parse_unit("s^-1").unwrap());
        let hubble = table.parse_unit("km s**(-1) Mpc^(-1)").unwrap();
        assert_eq!(hubble.symbol(), "km s^-1 Mpc^-1");
    }

    #[test]
    fn grouped_power_must_be_an_integer() {
        let table = UnitTable::standard();
        assert!(matches!(
            table.parse_unit("m^(1/2)"),
            Err(UnitError::Malformed { .. })
        ));
        assert!(matches!(
            table.parse_unit("m^(-1"),
            Err(UnitError::Malformed { .. })
        ));
    }

    #[test]
    fn non_finite_or_zero_factors_are_rejected() {
        let table = UnitTable::standard();
        for spec in ["inf m", "NaN s", "0 km", "m / 0", "infinity"] {
            assert!(
                matches!(table.parse_unit(spec), Err(UnitError::Malformed { .. })),
                "accepted {spec}"
            );
        }
    }

    #[test]
    fn define_rejects_non_finite_factor() {
        let mut table = UnitTable::standard();
        assert!(table.define("bad", f64::INFINITY, "m", false).is_err());
        assert!(table.define("none", 0.0, "m", false).is_err());
        assert!(!table.contains("bad"));
    }

    #[test]
    fn repeated_factors_merge() {
        let table = UnitTable::standard();
        let unit = table.parse_unit("m m").unwrap();
        assert_eq!(unit.symbol(), "m^2");
        let cancelled = table.parse_unit("m/m").unwrap();
        assert!(cancelled.is_dimensionless());
    }

    #[test]
    fn exact_symbol_beats_prefix() {
        let table = UnitTable::standard();
        // "h" is the hour, not hecto-nothing; "min" is not milli-"in"
        assert_eq!(table.parse_unit("h").unwrap().scale(), 3_600.0);
        assert_eq!(table.parse_unit("min").unwrap().scale(), 60.0);
    }

    #[test]
    fn prefix_requires_prefixable_unit() {
        let table = UnitTable::standard();
        assert!(table.contains("Gyr"));
        assert!(table.contains("kg"));
        assert!(!table.contains("kdeg"));
    }

    #[test]
    fn empty_spec_is_dimensionless() {
        let table = UnitTable::standard();
        assert!(table.parse_unit("").unwrap().is_dimensionless());
        assert!(table.parse_unit("dimensionless").unwrap().is_dimensionless());
    }

    #[test]
    fn numeric_factor_scales_unit() {
        let table = UnitTable::standard();
        let unit = table.parse_unit("1000 m").unwrap();
        assert_eq!(unit.symbol(), "1000 m");
        assert_eq!(unit.scale(), 1000.0);
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let table = UnitTable::standard();
        assert_eq!(
            table.parse_unit("km/parsnip"),
            Err(UnitError::UnknownUnit("parsnip".into()))
        );
    }

    #[test]
    fn malformed_specs_are_rejected() {
        let table = UnitTable::standard();
        assert!(matches!(
            table.parse_unit("km/"),
            Err(UnitError::Malformed { .. })
        ));
        assert!(matches!(
            table.parse_unit("(km"),
            Err(UnitError::Malformed { .. })
        ));
        assert!(matches!(
            table.parse_unit("m^x"),
            Err(UnitError::Malformed { .. })
        ));
    }

    #[test]
    fn converts_metres_to_kilometres() {
        let table = UnitTable::standard();
        let m = table.parse_unit("m").unwrap();
        let km = table.parse_unit("km").unwrap();
        assert_eq!(table.convert(1000.0, &m, &km, &[]).unwrap(), 1.0);
    }

    #[test]
    fn incompatible_without_equivalency() {
        let table = UnitTable::standard();
        let m = table.parse_unit("m").unwrap();
        let hz = table.parse_unit("Hz").unwrap();
        assert_eq!(
            table.convert(1.0, &m, &hz, &[]),
            Err(UnitError::Incompatible {
                from: "m".into(),
                to: "Hz".into()
            })
        );
    }

    #[test]
    fn equivalencies_bridge_dimensions() {
        let table = UnitTable::standard();
        let m = table.parse_unit("m").unwrap();
        let hz = table.parse_unit("Hz").unwrap();
        let freq = table
            .convert(1.0, &m, &hz, &[Equivalency::spectral()])
            .unwrap();
        assert!(approx(freq, 299_792_458.0));
    }

    #[test]
    fn first_matching_equivalency_wins() {
        let table = UnitTable::standard();
        let m = table.parse_unit("m").unwrap();
        let hz = table.parse_unit("Hz").unwrap();
        let doubled = Equivalency::new("doubled", m.clone(), hz.clone(), |v| v * 2.0, |v| v / 2.0);
        let result = table
            .convert(3.0, &m, &hz, &[doubled, Equivalency::spectral()])
            .unwrap();
        assert_eq!(result, 6.0);
    }

    #[test]
    fn define_adds_derived_unit() {
        let mut table = UnitTable::standard();
        table.define("furlong", 201.168, "m", false).unwrap();
        let furlong = table.parse_unit("furlong").unwrap();
        let m = table.parse_unit("m").unwrap();
        assert!(approx(table.convert(1.0, &furlong, &m, &[]).unwrap(), 201.168));
    }

    #[test]
    fn base_adds_new_dimension() {
        let mut table = UnitTable::new();
        table.base("ph", "photons", false);
        let unit = table.parse_unit("ph").unwrap();
        assert_eq!(unit.dimensions(), &dims(&[("photons", 1)]));
    }

    #[test]
    fn standard_with_config_defines_units() {
        let config = FixparamConfig {
            units: vec![UnitDef {
                symbol: "Rsun".into(),
                definition: "6.957e8 m".into(),
                prefixable: false,
            }],
            ..Default::default()
        };
        let table = UnitTable::standard_with(&config).unwrap();
        let rsun = table.parse_unit("Rsun").unwrap();
        assert!(approx(rsun.scale(), 6.957e8));
    }

    #[test]
    fn standard_with_config_reports_bad_definition() {
        let config = FixparamConfig {
            units: vec![UnitDef {
                symbol: "bad".into(),
                definition: "3 parsnips".into(),
                prefixable: false,
            }],
            ..Default::default()
        };
        assert!(UnitTable::standard_with(&config).is_err());
    }
}
