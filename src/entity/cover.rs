// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Cover entity of an Alarm.com garage door.
//!
//! Alarm.com only reports `TRANSITIONING` while the door moves. The direction is taken from the
//! door position the controller tracks on every refresh.

use super::{
    DeviceEntity, DeviceRecord, Entity, EntityType, STATE_MALFUNCTION, STATE_UNKNOWN,
    setup_entities,
};
use crate::controller::{ControllerHandle, Devices, DoorPositionState, GarageDoorData};
use crate::errors::ServiceError;
use crate::vendor::{GarageDoorCommand, GarageDoorState};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const STATE_OPEN: &str = "open";
pub const STATE_OPENING: &str = "opening";
pub const STATE_CLOSED: &str = "closed";
pub const STATE_CLOSING: &str = "closing";

pub const DEVICE_CLASS_GARAGE: &str = "garage";

// https://developers.home-assistant.io/docs/core/entity/cover#supported-features
pub const COVER_SUPPORT_OPEN: u32 = 1;
pub const COVER_SUPPORT_CLOSE: u32 = 2;

impl DeviceRecord for GarageDoorData {
    type Command = GarageDoorCommand;

    fn table(devices: &Devices) -> &BTreeMap<String, Self> {
        &devices.garage_doors
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn raw_state_text(&self) -> Option<&str> {
        self.raw_state_text.as_deref()
    }
}

/// Garage doors don't require an access code.
pub type CoverEntity = DeviceEntity<GarageDoorData>;

/// Create a cover entity for every garage door of the account.
pub fn setup_covers(handle: &ControllerHandle) -> Vec<CoverEntity> {
    setup_entities(handle, None)
}

impl CoverEntity {
    fn moving(&self, direction: DoorPositionState) -> bool {
        self.with_device(|d| {
            d.state == Some(GarageDoorState::Transitioning) && d.position == direction
        })
        .unwrap_or_default()
    }

    pub fn is_opening(&self) -> bool {
        self.moving(DoorPositionState::Opening)
    }

    pub fn is_closing(&self) -> bool {
        self.moving(DoorPositionState::Closing)
    }

    /// `None` if the door isn't in a confirmed position.
    pub fn is_closed(&self) -> Option<bool> {
        match self.with_device(|d| d.state).flatten() {
            Some(GarageDoorState::Open) => Some(false),
            Some(GarageDoorState::Closed) => Some(true),
            _ => None,
        }
    }

    pub async fn open_cover(&self) -> Result<bool, ServiceError> {
        self.dispatch(GarageDoorCommand::Open, None).await
    }

    pub async fn close_cover(&self) -> Result<bool, ServiceError> {
        self.dispatch(GarageDoorCommand::Close, None).await
    }
}

impl Entity for CoverEntity {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn entity_type(&self) -> EntityType {
        EntityType::Cover
    }

    fn name(&self) -> String {
        self.device_name()
    }

    fn state(&self) -> String {
        let state = match self.with_device(|d| d.state).flatten() {
            None | Some(GarageDoorState::Unknown) => STATE_MALFUNCTION,
            Some(GarageDoorState::Transitioning) => {
                if self.is_opening() {
                    STATE_OPENING
                } else if self.is_closing() {
                    STATE_CLOSING
                } else {
                    STATE_UNKNOWN
                }
            }
            Some(GarageDoorState::Open) => STATE_OPEN,
            Some(GarageDoorState::Closed) => STATE_CLOSED,
        };
        state.into()
    }

    fn extra_state_attributes(&self) -> Map<String, Value> {
        let mut attributes = self.base_attributes();
        self.with_device(|d| {
            attributes.insert("mismatched_states".into(), d.mismatched_states.into());
            attributes.insert(
                "desired_state".into(),
                d.desired_state.map(|s| s.as_ref().to_string()).into(),
            );
        });
        attributes
    }

    fn supported_features(&self) -> u32 {
        COVER_SUPPORT_OPEN | COVER_SUPPORT_CLOSE
    }

    fn device_class(&self) -> Option<&'static str> {
        Some(DEVICE_CLASS_GARAGE)
    }
}
