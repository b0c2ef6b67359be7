pub mod alarm_models;
pub mod camera_models;
pub mod report_models;

pub use alarm_models::{Alarm, NewAlarm};
pub use camera_models::{Camera, NewCamera};
pub use report_models::{NewReport, Report};
