use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Inclusive value domain of a single process parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDomain {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl FieldDomain {
    const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Values outside the domain (and non-finite values) resolve to `min`.
    pub fn resolve(&self, value: f64) -> f64 {
        if self.contains(value) {
            value
        } else {
            self.min
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterField {
    CementContent,
    WcRatio,
    ScmPct,
    RampRate,
    HoldTemperature,
    AmbientTemperature,
    MaturityIndex,
    MoldAvailability,
    EnergyTariff,
}

impl ParameterField {
    /// Form order.
    pub const ALL: [ParameterField; 9] = [
        ParameterField::CementContent,
        ParameterField::WcRatio,
        ParameterField::ScmPct,
        ParameterField::RampRate,
        ParameterField::HoldTemperature,
        ParameterField::AmbientTemperature,
        ParameterField::MaturityIndex,
        ParameterField::MoldAvailability,
        ParameterField::EnergyTariff,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ParameterField::CementContent => "cement_content",
            ParameterField::WcRatio => "wc_ratio",
            ParameterField::ScmPct => "scm_pct",
            ParameterField::RampRate => "ramp_rate",
            ParameterField::HoldTemperature => "hold_temperature",
            ParameterField::AmbientTemperature => "ambient_temperature",
            ParameterField::MaturityIndex => "maturity_index",
            ParameterField::MoldAvailability => "mold_availability",
            ParameterField::EnergyTariff => "energy_tariff",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParameterField::CementContent => "Cement (kg/m³)",
            ParameterField::WcRatio => "W/C Ratio",
            ParameterField::ScmPct => "SCM %",
            ParameterField::RampRate => "Ramp (°C/hr)",
            ParameterField::HoldTemperature => "Hold Temp (°C)",
            ParameterField::AmbientTemperature => "Ambient (°C)",
            ParameterField::MaturityIndex => "Maturity Target",
            ParameterField::MoldAvailability => "Mold Avail (%)",
            ParameterField::EnergyTariff => "Tariff (₹/kWh)",
        }
    }

    pub fn domain(self) -> FieldDomain {
        match self {
            ParameterField::CementContent => FieldDomain::new(200.0, 600.0, 1.0),
            ParameterField::WcRatio => FieldDomain::new(0.20, 0.70, 0.01),
            ParameterField::ScmPct => FieldDomain::new(0.0, 60.0, 1.0),
            ParameterField::RampRate => FieldDomain::new(5.0, 40.0, 1.0),
            ParameterField::HoldTemperature => FieldDomain::new(20.0, 85.0, 1.0),
            ParameterField::AmbientTemperature => FieldDomain::new(10.0, 50.0, 1.0),
            ParameterField::MaturityIndex => FieldDomain::new(200.0, 1000.0, 1.0),
            ParameterField::MoldAvailability => FieldDomain::new(50.0, 100.0, 1.0),
            ParameterField::EnergyTariff => FieldDomain::new(2.0, 15.0, 0.1),
        }
    }
}

impl fmt::Display for ParameterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ParameterField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        ParameterField::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| DomainError::UnknownParameter(key.to_string()))
    }
}

/// Tunable inputs for one recipe attempt. Serializes with the optimizer's wire keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameters {
    pub cement_content: f64,
    pub wc_ratio: f64,
    pub scm_pct: f64,
    pub ramp_rate: f64,
    pub hold_temperature: f64,
    pub ambient_temperature: f64,
    pub maturity_index: f64,
    pub mold_availability: f64,
    pub energy_tariff: f64,
}

impl Default for ProcessParameters {
    fn default() -> Self {
        Self {
            cement_content: 400.0,
            wc_ratio: 0.42,
            scm_pct: 25.0,
            ramp_rate: 20.0,
            hold_temperature: 65.0,
            ambient_temperature: 32.0,
            maturity_index: 550.0,
            mold_availability: 85.0,
            energy_tariff: 7.0,
        }
    }
}

impl ProcessParameters {
    pub fn get(&self, field: ParameterField) -> f64 {
        match field {
            ParameterField::CementContent => self.cement_content,
            ParameterField::WcRatio => self.wc_ratio,
            ParameterField::ScmPct => self.scm_pct,
            ParameterField::RampRate => self.ramp_rate,
            ParameterField::HoldTemperature => self.hold_temperature,
            ParameterField::AmbientTemperature => self.ambient_temperature,
            ParameterField::MaturityIndex => self.maturity_index,
            ParameterField::MoldAvailability => self.mold_availability,
            ParameterField::EnergyTariff => self.energy_tariff,
        }
    }

    fn slot(&mut self, field: ParameterField) -> &mut f64 {
        match field {
            ParameterField::CementContent => &mut self.cement_content,
            ParameterField::WcRatio => &mut self.wc_ratio,
            ParameterField::ScmPct => &mut self.scm_pct,
            ParameterField::RampRate => &mut self.ramp_rate,
            ParameterField::HoldTemperature => &mut self.hold_temperature,
            ParameterField::AmbientTemperature => &mut self.ambient_temperature,
            ParameterField::MaturityIndex => &mut self.maturity_index,
            ParameterField::MoldAvailability => &mut self.mold_availability,
            ParameterField::EnergyTariff => &mut self.energy_tariff,
        }
    }

    /// Stores `value` if it lies in the field's domain, otherwise the field minimum.
    /// Returns the value actually stored.
    pub fn set(&mut self, field: ParameterField, value: f64) -> f64 {
        let resolved = field.domain().resolve(value);
        *self.slot(field) = resolved;
        resolved
    }

    /// Applies raw form input. Non-numeric text resolves to the field minimum.
    pub fn set_from_input(&mut self, field: ParameterField, raw: &str) -> f64 {
        let value = raw.trim().parse::<f64>().unwrap_or(f64::NAN);
        self.set(field, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterField, f64)> + '_ {
        ParameterField::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    StrengthGainRate,
    DemouldTime,
    CostPerElement,
    EnergyConsumption,
    MoldUtilization,
    UnderStrengthRisk,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::StrengthGainRate,
        MetricKind::DemouldTime,
        MetricKind::CostPerElement,
        MetricKind::EnergyConsumption,
        MetricKind::MoldUtilization,
        MetricKind::UnderStrengthRisk,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MetricKind::StrengthGainRate => "Strength gain rate",
            MetricKind::DemouldTime => "Demould time",
            MetricKind::CostPerElement => "Cost per element",
            MetricKind::EnergyConsumption => "Energy consumption",
            MetricKind::MoldUtilization => "Mold utilization",
            MetricKind::UnderStrengthRisk => "Risk of under-strength",
        }
    }

    /// Decimal places a renderer should show.
    pub fn decimals(self) -> usize {
        match self {
            MetricKind::CostPerElement | MetricKind::EnergyConsumption => 0,
            MetricKind::DemouldTime | MetricKind::MoldUtilization => 1,
            MetricKind::StrengthGainRate | MetricKind::UnderStrengthRisk => 2,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessMetrics {
    #[serde(rename = "Strength gain rate")]
    pub strength_gain_rate: f64,
    #[serde(rename = "Demould time")]
    pub demould_time: f64,
    #[serde(rename = "Cost per element")]
    pub cost_per_element: f64,
    #[serde(rename = "Energy consumption")]
    pub energy_consumption: f64,
    #[serde(rename = "Mold utilization")]
    pub mold_utilization: f64,
    #[serde(rename = "Risk of under-strength")]
    pub under_strength_risk: f64,
}

impl ProcessMetrics {
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::StrengthGainRate => self.strength_gain_rate,
            MetricKind::DemouldTime => self.demould_time,
            MetricKind::CostPerElement => self.cost_per_element,
            MetricKind::EnergyConsumption => self.energy_consumption,
            MetricKind::MoldUtilization => self.mold_utilization,
            MetricKind::UnderStrengthRisk => self.under_strength_risk,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        MetricKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.get(kind)))
    }
}

/// Risk tracker rows as three parallel sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerData {
    pub categories: Vec<String>,
    pub before: Vec<f64>,
    pub after: Vec<f64>,
}

impl TrackerData {
    pub fn validate(&self) -> Result<(), DomainError> {
        let categories = self.categories.len();
        if self.before.len() != categories || self.after.len() != categories {
            return Err(DomainError::RaggedTracker {
                categories,
                before: self.before.len(),
                after: self.after.len(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = TrackerRow<'_>> + '_ {
        self.categories
            .iter()
            .zip(self.before.iter().zip(self.after.iter()))
            .map(|(category, (&before, &after))| TrackerRow {
                category,
                before,
                after,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerRow<'a> {
    pub category: &'a str,
    pub before: f64,
    pub after: f64,
}

impl TrackerRow<'_> {
    pub fn reduction(&self) -> f64 {
        self.before - self.after
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub metrics: ProcessMetrics,
    pub insight: String,
    pub tracker_data: TrackerData,
}

impl OptimizationResult {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.tracker_data.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_domain_input_falls_back_to_minimum() {
        let mut params = ProcessParameters::default();
        assert_eq!(params.set(ParameterField::CementContent, 700.0), 200.0);
        assert_eq!(params.set(ParameterField::WcRatio, 0.1), 0.20);
        assert_eq!(params.set(ParameterField::EnergyTariff, f64::NAN), 2.0);
        assert_eq!(params.set(ParameterField::HoldTemperature, 85.0), 85.0);
        assert_eq!(
            params.set_from_input(ParameterField::ScmPct, "abc"),
            0.0
        );
        assert_eq!(
            params.set_from_input(ParameterField::MaturityIndex, " 640 "),
            640.0
        );
        assert_eq!(
            params.set_from_input(ParameterField::RampRate, "inf"),
            5.0
        );
    }

    #[test]
    fn every_edit_stays_inside_domain() {
        let probes = [-1e9, -1.0, 0.0, 0.3, 1.0, 12.5, 55.0, 99.0, 250.0, 1e9];
        let mut params = ProcessParameters::default();
        for field in ParameterField::ALL {
            let domain = field.domain();
            for probe in probes {
                params.set(field, probe);
                assert!(domain.contains(params.get(field)), "{field} -> {probe}");
            }
        }
    }

    #[test]
    fn defaults_are_inside_their_domains() {
        let params = ProcessParameters::default();
        for (field, value) in params.iter() {
            assert!(field.domain().contains(value), "{field}");
        }
    }

    #[test]
    fn parameter_field_parses_wire_key() {
        assert_eq!(
            "hold_temperature".parse::<ParameterField>().unwrap(),
            ParameterField::HoldTemperature
        );
        assert!(matches!(
            "slump".parse::<ParameterField>(),
            Err(DomainError::UnknownParameter(key)) if key == "slump"
        ));
    }

    #[test]
    fn parameters_serialize_with_wire_keys() {
        let json = serde_json::to_value(ProcessParameters::default()).unwrap();
        for field in ParameterField::ALL {
            assert!(json.get(field.key()).is_some(), "{field}");
        }
    }

    #[test]
    fn metric_precision_matches_dashboard_cards() {
        assert_eq!(MetricKind::CostPerElement.decimals(), 0);
        assert_eq!(MetricKind::EnergyConsumption.decimals(), 0);
        assert_eq!(MetricKind::DemouldTime.decimals(), 1);
        assert_eq!(MetricKind::MoldUtilization.decimals(), 1);
        assert_eq!(MetricKind::StrengthGainRate.decimals(), 2);
        assert_eq!(MetricKind::UnderStrengthRisk.decimals(), 2);
    }

    #[test]
    fn ragged_tracker_is_rejected() {
        let tracker = TrackerData {
            categories: vec!["Strength variability".into(), "Climate dependency".into()],
            before: vec![18.0, 28.0],
            after: vec![4.0],
        };
        assert!(matches!(
            tracker.validate(),
            Err(DomainError::RaggedTracker {
                categories: 2,
                before: 2,
                after: 1
            })
        ));
    }

    #[test]
    fn tracker_rows_report_reduction() {
        let tracker = TrackerData {
            categories: vec!["Mold idle risk".into()],
            before: vec![32.0],
            after: vec![10.0],
        };
        let row = tracker.rows().next().unwrap();
        assert_eq!(row.category, "Mold idle risk");
        assert_eq!(row.reduction(), 22.0);
    }
}
