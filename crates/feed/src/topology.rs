//! Route topology payload: which station sequences each line currently runs.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyPayload {
    pub routes: HashMap<String, RoutePayload>,
    /// Changes whenever the topology itself changes; an unchanged checksum
    /// lets the engine skip a full reprocess.
    #[serde(default)]
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutePayload {
    pub name: String,
    /// Hex line color, e.g. `#ee352e`.
    pub color: String,
    #[serde(default)]
    pub routings: DirectionalRoutings,
}

/// Per-direction routing variants. Each inner sequence is an ordered list
/// of raw feed stop ids (station code plus a direction/platform suffix).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionalRoutings {
    #[serde(default)]
    pub north: Vec<Vec<String>>,
    #[serde(default)]
    pub south: Vec<Vec<String>>,
}

impl TopologyPayload {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Drop routes the engine cannot render: empty id or empty color.
    pub fn retain_valid(&mut self) {
        self.routes
            .retain(|id, route| !id.is_empty() && !route.color.is_empty());
    }
}
