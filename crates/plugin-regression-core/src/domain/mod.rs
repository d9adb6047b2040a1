//! Domain model for a single comparison run.

pub mod app;
pub mod infrastructure;
pub mod load;
pub mod request;
pub mod results;

pub use app::{AppSource, ParseAppSourceError, Variant, EMPTY_APP_LABEL};
pub use infrastructure::{ProvisioningParameters, ResourceBudget, DEFAULT_LIFESPAN};
pub use load::{Dataset, LoadProfile, Scenario};
pub use request::ComparisonRequest;
pub use results::{RawResult, RegressionResults};
