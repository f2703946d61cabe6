use serde::{Deserialize, Serialize};

/// Read-only projection of a managed device, exposed to templates as `device`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceView {
    pub id: i64,
    pub name: String,
    pub ip_address: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub device_group: Option<String>,
    #[serde(default)]
    pub dept_id: Option<i64>,
}
