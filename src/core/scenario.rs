use std::fmt;
use std::str::FromStr;

/// Attribute addressed by a carrier scaling option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleAttr {
    PNomMax,
    CapitalCost,
    MarginalCost,
}

impl ScaleAttr {
    fn from_code(code: char) -> Option<Self> {
        match code {
            'p' => Some(ScaleAttr::PNomMax),
            'c' => Some(ScaleAttr::CapitalCost),
            'm' => Some(ScaleAttr::MarginalCost),
            _ => None,
        }
    }
}

impl fmt::Display for ScaleAttr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScaleAttr::PNomMax => write!(f, "p_nom_max"),
            ScaleAttr::CapitalCost => write!(f, "capital_cost"),
            ScaleAttr::MarginalCost => write!(f, "marginal_cost"),
        }
    }
}

/// One token of the scenario option string.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioOpt {
    /// `3h`: average snapshots to a coarser resolution.
    Resample { hours: u32 },
    /// `120seg`: aggregate the horizon into equal-duration segments.
    Segment { segments: u32 },
    /// `Co2L` or `Co2L0.2`: emission cap, factor scales the reference budget.
    Co2Limit { factor: Option<f64> },
    /// `CH4L` or `CH4L1.5`: gas usage cap in millions of MWh thermal.
    GasLimit { factor: Option<f64> },
    /// `Ep` or `Ep80`: emission prices folded into marginal costs.
    EmissionPrices { co2_price: Option<f64> },
    /// `SAFE`: reserve-margin peak demand hour without variable feed-in.
    Safe,
    /// `solar+p1.5`: scale one attribute of one carrier.
    CarrierScale {
        carrier: String,
        attr: ScaleAttr,
        factor: f64,
    },
}

#[derive(Debug)]
pub enum ScenarioParseError {
    UnknownOption(String),
    InvalidFactor(String),
    InvalidTransmissionLimit(String),
}

impl fmt::Display for ScenarioParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioParseError::UnknownOption(o) => write!(f, "Unknown scenario option: {}", o),
            ScenarioParseError::InvalidFactor(o) => {
                write!(f, "Invalid numeric factor in option: {}", o)
            }
            ScenarioParseError::InvalidTransmissionLimit(l) => {
                write!(f, "Invalid transmission limit wildcard: {}", l)
            }
        }
    }
}

impl std::error::Error for ScenarioParseError {}

fn trailing_factor(token: &str, prefix: &str) -> Result<Option<f64>, ScenarioParseError> {
    let rest = &token[prefix.len()..];
    if rest.is_empty() {
        return Ok(None);
    }
    rest.parse::<f64>()
        .map(Some)
        .map_err(|_| ScenarioParseError::InvalidFactor(token.to_string()))
}

impl FromStr for ScenarioOpt {
    type Err = ScenarioParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.is_empty() {
            return Err(ScenarioParseError::UnknownOption(token.to_string()));
        }

        let lower = token.to_lowercase();
        if let Some(digits) = lower.strip_suffix("seg") {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                let segments = digits
                    .parse()
                    .map_err(|_| ScenarioParseError::InvalidFactor(token.to_string()))?;
                return Ok(ScenarioOpt::Segment { segments });
            }
        }
        if let Some(digits) = lower.strip_suffix('h') {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                let hours = digits
                    .parse()
                    .map_err(|_| ScenarioParseError::InvalidFactor(token.to_string()))?;
                return Ok(ScenarioOpt::Resample { hours });
            }
        }

        if token.starts_with("Co2L") {
            return Ok(ScenarioOpt::Co2Limit {
                factor: trailing_factor(token, "Co2L")?,
            });
        }
        if token.starts_with("CH4L") {
            return Ok(ScenarioOpt::GasLimit {
                factor: trailing_factor(token, "CH4L")?,
            });
        }
        if token.starts_with("Ep") {
            return Ok(ScenarioOpt::EmissionPrices {
                co2_price: trailing_factor(token, "Ep")?,
            });
        }
        if token == "SAFE" {
            return Ok(ScenarioOpt::Safe);
        }

        if let Some((carrier, spec)) = token.split_once('+') {
            let mut chars = spec.chars();
            let attr = chars
                .next()
                .and_then(ScaleAttr::from_code)
                .ok_or_else(|| ScenarioParseError::UnknownOption(token.to_string()))?;
            let factor: f64 = chars
                .as_str()
                .parse()
                .map_err(|_| ScenarioParseError::InvalidFactor(token.to_string()))?;
            return Ok(ScenarioOpt::CarrierScale {
                carrier: carrier.to_string(),
                attr,
                factor,
            });
        }

        Err(ScenarioParseError::UnknownOption(token.to_string()))
    }
}

/// Parse a `-`-separated option string, preserving token order.
pub fn parse_opts(opts: &str) -> Result<Vec<ScenarioOpt>, ScenarioParseError> {
    if opts.is_empty() {
        return Ok(Vec::new());
    }
    opts.split('-').map(ScenarioOpt::from_str).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Cost,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitFactor {
    /// Expansion is free; the optimiser decides.
    Opt,
    /// Expansion bounded at factor times today's transmission.
    Fixed(f64),
}

/// The `ll` wildcard: how far transmission may be expanded and whether the
/// bound is on cost or on volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionLimit {
    pub kind: LimitKind,
    pub factor: LimitFactor,
}

impl FromStr for TransmissionLimit {
    type Err = ScenarioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = match chars.next() {
            Some('c') => LimitKind::Cost,
            Some('v') => LimitKind::Volume,
            _ => return Err(ScenarioParseError::InvalidTransmissionLimit(s.to_string())),
        };
        let rest = chars.as_str();
        let factor = if rest == "opt" {
            LimitFactor::Opt
        } else {
            let value: f64 = rest
                .parse()
                .map_err(|_| ScenarioParseError::InvalidTransmissionLimit(s.to_string()))?;
            if value < 1.0 {
                return Err(ScenarioParseError::InvalidTransmissionLimit(s.to_string()));
            }
            LimitFactor::Fixed(value)
        };
        Ok(TransmissionLimit { kind, factor })
    }
}

/// A fully parsed scenario specification with the raw wildcard strings kept
/// for naming outputs.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub ll: TransmissionLimit,
    pub opts: Vec<ScenarioOpt>,
    ll_raw: String,
    opts_raw: String,
}

impl Scenario {
    pub fn parse(ll: &str, opts: &str) -> Result<Self, ScenarioParseError> {
        Ok(Self {
            ll: ll.parse()?,
            opts: parse_opts(opts)?,
            ll_raw: ll.to_string(),
            opts_raw: opts.to_string(),
        })
    }

    pub fn ll_raw(&self) -> &str {
        &self.ll_raw
    }

    pub fn opts_raw(&self) -> &str {
        &self.opts_raw
    }

    /// Directory name of the exported network for this scenario.
    pub fn dir_name(&self) -> String {
        format!("elec_{}_{}", self.ll_raw, self.opts_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_co2_limit_with_and_without_factor() {
        assert_eq!(
            "Co2L0.2".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::Co2Limit { factor: Some(0.2) }
        );
        assert_eq!(
            "Co2L".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::Co2Limit { factor: None }
        );
    }

    #[test]
    fn parses_temporal_options() {
        assert_eq!(
            "3h".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::Resample { hours: 3 }
        );
        assert_eq!(
            "24H".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::Resample { hours: 24 }
        );
        assert_eq!(
            "120seg".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::Segment { segments: 120 }
        );
    }

    #[test]
    fn parses_gas_limit_and_emission_prices() {
        assert_eq!(
            "CH4L1.5".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::GasLimit { factor: Some(1.5) }
        );
        assert_eq!(
            "Ep".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::EmissionPrices { co2_price: None }
        );
        assert_eq!(
            "Ep80".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::EmissionPrices {
                co2_price: Some(80.0)
            }
        );
    }

    #[test]
    fn parses_carrier_scaling() {
        assert_eq!(
            "solar+p1.5".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::CarrierScale {
                carrier: "solar".to_string(),
                attr: ScaleAttr::PNomMax,
                factor: 1.5
            }
        );
        assert_eq!(
            "AC+c0.8".parse::<ScenarioOpt>().unwrap(),
            ScenarioOpt::CarrierScale {
                carrier: "AC".to_string(),
                attr: ScaleAttr::CapitalCost,
                factor: 0.8
            }
        );
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(matches!(
            "bogus".parse::<ScenarioOpt>(),
            Err(ScenarioParseError::UnknownOption(_))
        ));
        assert!(matches!(
            "solar+x2".parse::<ScenarioOpt>(),
            Err(ScenarioParseError::UnknownOption(_))
        ));
        assert!(matches!(
            "Co2Labc".parse::<ScenarioOpt>(),
            Err(ScenarioParseError::InvalidFactor(_))
        ));
    }

    #[test]
    fn opts_string_keeps_order() {
        let opts = parse_opts("Co2L-3h-Ep").unwrap();
        assert_eq!(opts.len(), 3);
        assert!(matches!(opts[0], ScenarioOpt::Co2Limit { .. }));
        assert!(matches!(opts[1], ScenarioOpt::Resample { hours: 3 }));
        assert!(matches!(opts[2], ScenarioOpt::EmissionPrices { .. }));
    }

    #[test]
    fn parses_transmission_limits() {
        let copt: TransmissionLimit = "copt".parse().unwrap();
        assert_eq!(copt.kind, LimitKind::Cost);
        assert_eq!(copt.factor, LimitFactor::Opt);

        let v125: TransmissionLimit = "v1.25".parse().unwrap();
        assert_eq!(v125.kind, LimitKind::Volume);
        assert_eq!(v125.factor, LimitFactor::Fixed(1.25));
    }

    #[test]
    fn rejects_shrinking_transmission() {
        assert!("v0.5".parse::<TransmissionLimit>().is_err());
        assert!("x1.0".parse::<TransmissionLimit>().is_err());
        assert!("c".parse::<TransmissionLimit>().is_err());
    }

    #[test]
    fn scenario_dir_name_embeds_wildcards() {
        let scenario = Scenario::parse("copt", "Co2L-3h").unwrap();
        assert_eq!(scenario.dir_name(), "elec_copt_Co2L-3h");
    }
}
