// src/types.rs
//
// Shared types for the disaster-response engine: the closed action alphabet,
// the bounds-checked wire codec, and resource classification.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length of a wire-encoded action triple.
pub const WIRE_ACTION_LEN: usize = 3;

/// The closed set of dispatchable action types.
///
/// The wire format is an integer in [0,5); the mapping is explicit here so
/// that invalid integers are rejected at the boundary instead of being
/// silently indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    SendAmbulance,
    SendMedicalTeam,
    SendSupplyTruck,
    EvacuateZone,
    OpenShelter,
}

impl ActionType {
    pub const COUNT: usize = 5;

    pub const ALL: [ActionType; Self::COUNT] = [
        ActionType::SendAmbulance,
        ActionType::SendMedicalTeam,
        ActionType::SendSupplyTruck,
        ActionType::EvacuateZone,
        ActionType::OpenShelter,
    ];

    /// Wire integer for this action type.
    pub fn to_wire(self) -> u32 {
        match self {
            ActionType::SendAmbulance => 0,
            ActionType::SendMedicalTeam => 1,
            ActionType::SendSupplyTruck => 2,
            ActionType::EvacuateZone => 3,
            ActionType::OpenShelter => 4,
        }
    }

    /// Decode a wire integer. Returns None for anything outside [0,5).
    pub fn from_wire(value: i64) -> Option<ActionType> {
        match value {
            0 => Some(ActionType::SendAmbulance),
            1 => Some(ActionType::SendMedicalTeam),
            2 => Some(ActionType::SendSupplyTruck),
            3 => Some(ActionType::EvacuateZone),
            4 => Some(ActionType::OpenShelter),
            _ => None,
        }
    }

    /// Human-readable label used in explanations and logs.
    pub fn label(self) -> &'static str {
        match self {
            ActionType::SendAmbulance => "Send Ambulance",
            ActionType::SendMedicalTeam => "Send Medical Team",
            ActionType::SendSupplyTruck => "Send Supply Truck",
            ActionType::EvacuateZone => "Evacuate Zone",
            ActionType::OpenShelter => "Open Shelter",
        }
    }

    /// True for the three dispatch types that reduce zone risk.
    pub fn is_dispatch(self) -> bool {
        matches!(
            self,
            ActionType::SendAmbulance | ActionType::SendMedicalTeam | ActionType::SendSupplyTruck
        )
    }
}

/// A single decision: which action, with which resource, against which zone.
///
/// Immutable once recorded. Indices are already bounds-checked against the
/// scenario's `ActionSpace` when decoded from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionType,
    pub resource_id: usize,
    pub target_zone: usize,
}

impl Action {
    pub fn new(action_type: ActionType, resource_id: usize, target_zone: usize) -> Self {
        Self {
            action_type,
            resource_id,
            target_zone,
        }
    }

    /// Wire triple `[action_type, resource_id, target_zone_id]`.
    pub fn to_wire(&self) -> [u32; WIRE_ACTION_LEN] {
        [
            self.action_type.to_wire(),
            self.resource_id as u32,
            self.target_zone as u32,
        ]
    }
}

/// Valid index ranges for actions in a configured scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub num_resources: usize,
    pub num_zones: usize,
}

impl ActionSpace {
    pub fn new(num_resources: usize, num_zones: usize) -> Self {
        Self {
            num_resources,
            num_zones,
        }
    }

    /// Decode and bounds-check a wire triple.
    pub fn decode(&self, wire: &[i64]) -> Result<Action> {
        if wire.len() != WIRE_ACTION_LEN {
            return Err(Error::Validation(format!(
                "action triple must have {} elements, got {}",
                WIRE_ACTION_LEN,
                wire.len()
            )));
        }

        let action_type = ActionType::from_wire(wire[0])
            .ok_or_else(|| Error::Validation(format!("unknown action type {}", wire[0])))?;

        let resource_id = usize::try_from(wire[1])
            .ok()
            .filter(|&r| r < self.num_resources)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "resource id {} out of range [0,{})",
                    wire[1], self.num_resources
                ))
            })?;

        let target_zone = usize::try_from(wire[2])
            .ok()
            .filter(|&z| z < self.num_zones)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "target zone {} out of range [0,{})",
                    wire[2], self.num_zones
                ))
            })?;

        Ok(Action {
            action_type,
            resource_id,
            target_zone,
        })
    }

    /// True if the action's indices fall inside this space.
    pub fn contains(&self, action: &Action) -> bool {
        action.resource_id < self.num_resources && action.target_zone < self.num_zones
    }
}

/// Classification of a mobile resource unit.
///
/// Kinds are assigned round-robin at scenario setup and are descriptive:
/// dispatch actions do not check the kind of the resource they reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Ambulance,
    MedicalTeam,
    SupplyTruck,
}

impl ResourceKind {
    /// Round-robin kind for the resource at `index`.
    pub fn for_index(index: usize) -> Self {
        match index % 3 {
            0 => ResourceKind::Ambulance,
            1 => ResourceKind::MedicalTeam,
            _ => ResourceKind::SupplyTruck,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Ambulance => "ambulance",
            ResourceKind::MedicalTeam => "medical_team",
            ResourceKind::SupplyTruck => "supply_truck",
        }
    }
}
