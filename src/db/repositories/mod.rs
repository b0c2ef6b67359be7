pub mod alarms;
pub mod cameras;
pub mod reports;

pub use alarms::{AlarmStore, AlarmsRepository};
pub use cameras::CamerasRepository;
pub use reports::ReportsRepository;
