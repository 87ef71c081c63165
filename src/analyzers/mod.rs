pub mod chart;
pub mod dashboard_analyzer;

pub use chart::ChartFigure;
pub use dashboard_analyzer::{ChannelSummary, DashboardAnalyzer, ParameterOptions, SummaryTable};
