//! System/maintenance (component C10)

pub mod logger;
pub mod maintenance;
pub mod node_info;

pub use maintenance::MaintenanceController;
pub use node_info::{NodeInfo, NodeInfoProvider};
