pub mod constants;
pub mod detection_result;
pub mod frame;
pub mod region;
