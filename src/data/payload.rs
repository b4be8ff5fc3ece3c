use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::periods;

/// Company header shown on the overview tab. Passed through as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub reporting_year: Option<i32>,
    #[serde(default)]
    pub currency: Option<String>,
}

fn default_ghg_unit() -> String {
    "tCO2e".to_string()
}

fn default_waste_unit() -> String {
    "t".to_string()
}

/// Greenhouse-gas emissions for one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsPeriod {
    pub period: String,
    #[serde(default)]
    pub scope1: f64,
    #[serde(default)]
    pub scope2: f64,
    #[serde(default)]
    pub scope3: f64,
}

impl EmissionsPeriod {
    pub fn total(&self) -> f64 {
        self.scope1 + self.scope2 + self.scope3
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhgPayload {
    #[serde(default = "default_ghg_unit")]
    pub unit: String,
    #[serde(default)]
    pub periods: Vec<EmissionsPeriod>,
}

/// Waste quantities for one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WastePeriod {
    pub period: String,
    #[serde(default)]
    pub generated: f64,
    #[serde(default)]
    pub recycled: f64,
    #[serde(default)]
    pub landfilled: f64,
    #[serde(default)]
    pub incinerated: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WastePayload {
    #[serde(default = "default_waste_unit")]
    pub unit: String,
    #[serde(default)]
    pub periods: Vec<WastePeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentCount {
    pub name: String,
    pub headcount: u64,
    #[serde(default)]
    pub female: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    pub period: String,
    pub value: f64,
}

/// Workforce diversity snapshot plus an optional headcount history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkforcePayload {
    /// Falls back to the sum of the gender breakdown when absent.
    #[serde(default)]
    pub total_employees: Option<u64>,
    #[serde(default)]
    pub gender: Vec<CategoryCount>,
    #[serde(default)]
    pub age_groups: Vec<CategoryCount>,
    #[serde(default)]
    pub departments: Vec<DepartmentCount>,
    #[serde(default)]
    pub headcount: Vec<PeriodValue>,
}

impl WorkforcePayload {
    pub fn total(&self) -> u64 {
        self.total_employees
            .unwrap_or_else(|| self.gender.iter().map(|g| g.count).sum())
    }
}

/// A pre-computed ESG report as delivered by the reporting backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    #[serde(default)]
    pub company: Option<CompanyInfo>,
    #[serde(default)]
    pub ghg: Option<GhgPayload>,
    #[serde(default)]
    pub waste: Option<WastePayload>,
    #[serde(default)]
    pub workforce: Option<WorkforcePayload>,
}

impl DashboardPayload {
    pub fn is_empty(&self) -> bool {
        self.ghg.is_none() && self.waste.is_none() && self.workforce.is_none()
    }

    /// Put every period list in chronological order when all of its labels
    /// parse as periods; opaque labels keep document order.
    pub fn sort_periods(&mut self) {
        if let Some(ghg) = self.ghg.as_mut() {
            reorder_by_period(&mut ghg.periods, |p| &p.period);
        }
        if let Some(waste) = self.waste.as_mut() {
            reorder_by_period(&mut waste.periods, |p| &p.period);
        }
        if let Some(wf) = self.workforce.as_mut() {
            reorder_by_period(&mut wf.headcount, |p| &p.period);
        }
    }
}

fn reorder_by_period<T: Clone>(items: &mut Vec<T>, period: impl Fn(&T) -> &String) {
    let labels: Vec<String> = items.iter().map(|i| period(i).clone()).collect();
    match periods::chronological_order(&labels) {
        Some(order) => {
            let sorted: Vec<T> = order.into_iter().map(|i| items[i].clone()).collect();
            *items = sorted;
        }
        None => {
            if !items.is_empty() {
                tracing::warn!("Period labels are not all dates; keeping document order");
            }
        }
    }
}

/// Parse a payload document and normalise its period order.
pub fn parse_payload(json: &str) -> Result<DashboardPayload, String> {
    let mut payload: DashboardPayload =
        serde_json::from_str(json).map_err(|e| format!("Invalid payload: {e}"))?;
    if payload.is_empty() {
        return Err("Payload contains no ghg, waste or workforce section".to_string());
    }
    payload.sort_periods();
    Ok(payload)
}

/// Read and parse a payload JSON file.
pub fn load_payload(path: &Path) -> Result<DashboardPayload, String> {
    let json = std::fs::read_to_string(path).map_err(|e| format!("Cannot read file: {e}"))?;
    parse_payload(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "company": { "name": "Acme", "industry": "Manufacturing", "reporting_year": 2024 },
        "ghg": { "periods": [
            { "period": "2024-03", "scope1": 3.0, "scope2": 1.0, "scope3": 6.0 },
            { "period": "2024-01", "scope1": 1.0, "scope2": 1.0, "scope3": 2.0 },
            { "period": "2024-02", "scope1": 2.0, "scope2": 1.0, "scope3": 4.0, "extra": true }
        ] },
        "workforce": { "gender": [ { "category": "Female", "count": 4 }, { "category": "Male", "count": 6 } ] }
    }"#;

    #[test]
    fn parses_and_sorts_periods() {
        let payload = parse_payload(SAMPLE).unwrap();
        let ghg = payload.ghg.as_ref().unwrap();
        assert_eq!(ghg.unit, "tCO2e");
        let order: Vec<&str> = ghg.periods.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(order, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(ghg.periods[2].total(), 10.0);
        assert!(payload.waste.is_none());
        assert_eq!(payload.company.as_ref().unwrap().name, "Acme");
    }

    #[test]
    fn workforce_total_falls_back_to_gender_sum() {
        let payload = parse_payload(SAMPLE).unwrap();
        assert_eq!(payload.workforce.unwrap().total(), 10);
    }

    #[test]
    fn opaque_period_labels_keep_order() {
        let json = r#"{ "waste": { "periods": [
            { "period": "Site B", "generated": 2.0 },
            { "period": "Site A", "generated": 1.0 }
        ] } }"#;
        let payload = parse_payload(json).unwrap();
        let waste = payload.waste.unwrap();
        assert_eq!(waste.unit, "t");
        assert_eq!(waste.periods[0].period, "Site B");
    }

    #[test]
    fn rejects_empty_and_malformed_documents() {
        assert!(parse_payload("{}").unwrap_err().contains("no ghg"));
        assert!(parse_payload("{ not json").unwrap_err().starts_with("Invalid payload"));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let payload = load_payload(file.path()).unwrap();
        assert!(payload.ghg.is_some());

        let missing = load_payload(Path::new("/definitely/not/here.json"));
        assert!(missing.unwrap_err().starts_with("Cannot read file"));
    }
}
