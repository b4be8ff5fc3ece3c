pub mod app_state;
pub mod metric_series;
pub mod theme;
