//! Business logic services for the Estate Irrigation Monitor

pub mod agronomy;
pub mod dashboard;
pub mod observation;
pub mod plot;
pub mod soil;
pub mod weather;

pub use agronomy::AgronomyService;
pub use dashboard::DashboardService;
pub use observation::ObservationService;
pub use plot::PlotService;
pub use soil::SoilService;
pub use weather::WeatherService;
