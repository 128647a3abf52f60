// ── Site-wide switch settings ──

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ids::MacAddress;

/// The `global_switch` settings record, parsed once per pass.
///
/// Devices listed in `exclusions` keep their own per-device values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSwitchSettings {
    pub jumbo_frames: Option<bool>,
    pub flow_control: Option<bool>,
    pub exclusions: BTreeSet<MacAddress>,
}

impl GlobalSwitchSettings {
    pub fn is_excluded(&self, mac: &MacAddress) -> bool {
        self.exclusions.contains(mac)
    }
}
