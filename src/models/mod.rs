pub mod alert;
pub mod portfolio;
pub mod position;
pub mod risk_assessment;

pub use alert::*;
pub use portfolio::*;
pub use position::*;
pub use risk_assessment::*;
