// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! In-memory device registry shared between the controller and the entities.

use crate::vendor::{
    AccountSnapshot, DeviceType, GarageDoorState, LockState, PartitionState,
};
use log::debug;
use rust_fsm::*;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Registry handle. Only the controller replaces the content, entities only read it.
pub type DeviceRegistry = Rc<RefCell<Devices>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemData {
    pub unique_id: String,
    pub name: String,
    pub malfunction: bool,
    pub unit_id: Option<String>,
    pub mac_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartitionData {
    pub unique_id: String,
    pub name: String,
    pub state: Option<PartitionState>,
    pub malfunction: bool,
    pub parent_id: Option<String>,
    pub mac_address: Option<String>,
    pub raw_state_text: Option<String>,
    pub mismatched_states: bool,
    pub desired_state: Option<PartitionState>,
    pub uncleared_issues: Option<bool>,
}

// Alarm.com only reports `TRANSITIONING` while a garage door moves. The direction follows from the
// last confirmed position.
state_machine! {
    derive(Debug, Clone, Copy, PartialEq, Eq)
    pub DoorPosition(Unknown)

    Unknown => {
        ReportedOpen => Open,
        ReportedClosed => Closed,
    },
    Open => {
        ReportedOpen => Open,
        ReportedClosed => Closed,
        ReportedTransitioning => Closing,
    },
    Closed => {
        ReportedOpen => Open,
        ReportedClosed => Closed,
        ReportedTransitioning => Opening,
    },
    Opening => {
        ReportedOpen => Open,
        ReportedClosed => Closed,
        ReportedTransitioning => Opening,
    },
    Closing => {
        ReportedOpen => Open,
        ReportedClosed => Closed,
        ReportedTransitioning => Closing,
    },
}

impl Default for DoorPositionState {
    fn default() -> Self {
        DoorPositionState::Unknown
    }
}

/// Advance the door position with a newly reported state.
///
/// An unknown or missing state keeps the position. A transition without a confirmed position is
/// rejected, the direction stays unknown.
pub(crate) fn track_position(
    position: DoorPositionState,
    reported: Option<GarageDoorState>,
) -> DoorPositionState {
    let input = match reported {
        Some(GarageDoorState::Open) => DoorPositionInput::ReportedOpen,
        Some(GarageDoorState::Closed) => DoorPositionInput::ReportedClosed,
        Some(GarageDoorState::Transitioning) => DoorPositionInput::ReportedTransitioning,
        Some(GarageDoorState::Unknown) | None => return position,
    };
    match DoorPosition::transition(&position, &input) {
        Some(next) => next,
        None => {
            debug!("Garage door direction unknown: {input:?} in position {position:?}");
            position
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GarageDoorData {
    pub unique_id: String,
    pub name: String,
    pub state: Option<GarageDoorState>,
    pub malfunction: bool,
    pub parent_id: Option<String>,
    pub mac_address: Option<String>,
    pub raw_state_text: Option<String>,
    pub mismatched_states: bool,
    pub desired_state: Option<GarageDoorState>,
    /// Last confirmed position or movement direction, kept across refreshes
    #[serde(skip)]
    pub position: DoorPositionState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LockData {
    pub unique_id: String,
    pub name: String,
    pub state: Option<LockState>,
    pub malfunction: bool,
    pub parent_id: Option<String>,
    pub battery_low: bool,
    pub mac_address: Option<String>,
    pub raw_state_text: Option<String>,
    pub mismatched_states: bool,
    pub desired_state: Option<LockState>,
}

/// All devices of one account, keyed by device id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Devices {
    pub systems: BTreeMap<String, SystemData>,
    pub partitions: BTreeMap<String, PartitionData>,
    pub garage_doors: BTreeMap<String, GarageDoorData>,
    pub locks: BTreeMap<String, LockData>,
}

impl Devices {
    pub fn from_snapshot(snapshot: AccountSnapshot) -> Self {
        let mut devices = Devices::default();

        for src in snapshot.systems {
            devices.systems.insert(
                src.id.clone(),
                SystemData {
                    unique_id: src.id,
                    name: src.name,
                    malfunction: src.malfunction,
                    unit_id: src.unit_id,
                    mac_address: src.mac_address,
                },
            );
        }

        for src in snapshot.partitions {
            devices.partitions.insert(
                src.id.clone(),
                PartitionData {
                    unique_id: src.id,
                    name: src.name,
                    state: src.state,
                    malfunction: src.malfunction,
                    parent_id: src.system_id,
                    mac_address: src.mac_address,
                    raw_state_text: src.raw_state_text,
                    mismatched_states: src.mismatched_states,
                    desired_state: src.desired_state,
                    uncleared_issues: src.uncleared_issues,
                },
            );
        }

        for src in snapshot.garage_doors {
            devices.garage_doors.insert(
                src.id.clone(),
                GarageDoorData {
                    unique_id: src.id,
                    name: src.name,
                    state: src.state,
                    malfunction: src.malfunction,
                    parent_id: src.partition_id,
                    mac_address: src.mac_address,
                    raw_state_text: src.raw_state_text,
                    mismatched_states: src.mismatched_states,
                    desired_state: src.desired_state,
                    position: track_position(DoorPositionState::Unknown, src.state),
                },
            );
        }

        for src in snapshot.locks {
            devices.locks.insert(
                src.id.clone(),
                LockData {
                    unique_id: src.id,
                    name: src.name,
                    state: src.state,
                    malfunction: src.malfunction,
                    parent_id: src.partition_id,
                    battery_low: src.battery_low || src.battery_critical,
                    mac_address: src.mac_address,
                    raw_state_text: src.raw_state_text,
                    mismatched_states: src.mismatched_states,
                    desired_state: src.desired_state,
                },
            );
        }

        devices
    }

    /// Replace the device data with a new snapshot.
    ///
    /// Garage door positions continue from the previous data.
    pub fn update(&mut self, snapshot: AccountSnapshot) {
        let mut devices = Devices::from_snapshot(snapshot);
        for (id, door) in devices.garage_doors.iter_mut() {
            if let Some(previous) = self.garage_doors.get(id) {
                door.position = track_position(previous.position, door.state);
            }
        }
        *self = devices;
    }

    /// Check if a device of the given category is known.
    pub fn contains(&self, device_type: DeviceType, device_id: &str) -> bool {
        match device_type {
            DeviceType::System => self.systems.contains_key(device_id),
            DeviceType::Partition => self.partitions.contains_key(device_id),
            DeviceType::GarageDoor => self.garage_doors.contains_key(device_id),
            DeviceType::Lock => self.locks.contains_key(device_id),
        }
    }
}
