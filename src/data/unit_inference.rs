/// Infer the display unit from a metric or column name.
pub fn infer_unit(metric_name: &str) -> String {
    let lower = metric_name.to_lowercase();
    // Whole words only: "generated" and "incinerated" both contain "rate".
    let is_ratio_word = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| matches!(w, "rate" | "share" | "ratio" | "percent" | "percentage" | "pct"));

    if lower.contains('%') || is_ratio_word {
        "%".to_string()
    } else if lower.contains("scope") || lower.contains("co2") || lower.contains("ghg")
        || lower.contains("emission") || lower.contains("carbon") {
        "tCO2e".to_string()
    } else if lower.contains("waste") || lower.contains("recycl") || lower.contains("landfill")
        || lower.contains("incinerat") || lower.contains("tonne") {
        "t".to_string()
    } else if lower.contains("energy") || lower.contains("kwh") || lower.contains("mwh")
        || lower.contains("electric") {
        "MWh".to_string()
    } else if lower.contains("water") {
        "m\u{00B3}".to_string()
    } else if lower.contains("employee") || lower.contains("headcount") || lower.contains("staff")
        || lower.contains("hires") || lower.contains("fte") {
        "people".to_string()
    } else {
        "units".to_string()
    }
}
