// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Lock entity of an Alarm.com lock.

use super::{
    CodeFormat, DeviceEntity, DeviceRecord, Entity, EntityType, STATE_MALFUNCTION,
    setup_entities,
};
use crate::controller::{ControllerHandle, Devices, LockData};
use crate::errors::ServiceError;
use crate::vendor::{LockCommand, LockState};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum LockStatus {
    Locked,
    Unlocked,
    Jammed,
}

pub type LockEntity = DeviceEntity<LockData>;

impl DeviceRecord for LockData {
    type Command = LockCommand;

    fn table(devices: &Devices) -> &BTreeMap<String, Self> {
        &devices.locks
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn raw_state_text(&self) -> Option<&str> {
        self.raw_state_text.as_deref()
    }
}

/// Create a lock entity for every lock of the account.
pub fn setup_locks(handle: &ControllerHandle) -> Vec<LockEntity> {
    setup_entities(handle, handle.options.lock_code.as_ref())
}

/// A malfunctioning lock has no trustworthy state.
pub(crate) fn map_lock_state(state: Option<LockState>, malfunction: bool) -> Option<LockStatus> {
    if malfunction {
        return None;
    }
    match state {
        Some(LockState::Locked) => Some(LockStatus::Locked),
        Some(LockState::Unlocked) => Some(LockStatus::Unlocked),
        Some(LockState::Failed) => Some(LockStatus::Jammed),
        Some(LockState::Unknown) | None => None,
    }
}

impl LockEntity {
    /// `None` if the lock state is unknown.
    pub fn is_locked(&self) -> Option<LockStatus> {
        self.with_device(|d| map_lock_state(d.state, d.malfunction))
            .flatten()
    }

    /// The same format is reported for numeric and alphanumeric codes.
    pub fn code_format(&self) -> Option<CodeFormat> {
        self.code_guard()
            .is_configured()
            .then_some(CodeFormat::Text)
    }

    pub async fn lock(&self, code: Option<&str>) -> Result<bool, ServiceError> {
        self.dispatch(LockCommand::Lock, code).await
    }

    pub async fn unlock(&self, code: Option<&str>) -> Result<bool, ServiceError> {
        self.dispatch(LockCommand::Unlock, code).await
    }
}

impl Entity for LockEntity {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn entity_type(&self) -> EntityType {
        EntityType::Lock
    }

    fn name(&self) -> String {
        self.device_name()
    }

    fn state(&self) -> String {
        match self.is_locked() {
            Some(status) => status.to_string(),
            None => STATE_MALFUNCTION.into(),
        }
    }

    fn extra_state_attributes(&self) -> Map<String, Value> {
        let mut attributes = self.base_attributes();
        self.with_device(|d| {
            attributes.insert("mismatched_states".into(), d.mismatched_states.into());
            attributes.insert(
                "desired_state".into(),
                d.desired_state.map(|s| s.as_ref().to_string()).into(),
            );
            attributes.insert("battery_low".into(), d.battery_low.into());
        });
        attributes
    }
}
