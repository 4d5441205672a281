// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Alarm control panel entity of an Alarm.com partition.

use super::{
    CodeFormat, DeviceEntity, DeviceRecord, Entity, EntityType, STATE_MALFUNCTION,
    setup_entities,
};
use crate::controller::{ControllerHandle, Devices, PartitionData};
use crate::errors::ServiceError;
use crate::util::title_case;
use crate::vendor::{PartitionCommand, PartitionState};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const STATE_ALARM_DISARMED: &str = "disarmed";
pub const STATE_ALARM_ARMED_HOME: &str = "armed_home";
pub const STATE_ALARM_ARMED_AWAY: &str = "armed_away";
pub const STATE_ALARM_ARMED_NIGHT: &str = "armed_night";

// https://developers.home-assistant.io/docs/core/entity/alarm-control-panel#supported-features
pub const ALARM_SUPPORT_ARM_HOME: u32 = 1;
pub const ALARM_SUPPORT_ARM_AWAY: u32 = 2;
pub const ALARM_SUPPORT_ARM_NIGHT: u32 = 4;

pub type AlarmPanelEntity = DeviceEntity<PartitionData>;

impl DeviceRecord for PartitionData {
    type Command = PartitionCommand;

    fn table(devices: &Devices) -> &BTreeMap<String, Self> {
        &devices.partitions
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn raw_state_text(&self) -> Option<&str> {
        self.raw_state_text.as_deref()
    }
}

/// Create an alarm panel entity for every partition of the account.
pub fn setup_alarm_panels(handle: &ControllerHandle) -> Vec<AlarmPanelEntity> {
    setup_entities(handle, handle.options.arm_code.as_ref())
}

pub(crate) fn map_partition_state(
    state: Option<PartitionState>,
    mismatched_states: bool,
) -> &'static str {
    if mismatched_states {
        return STATE_MALFUNCTION;
    }
    match state {
        Some(PartitionState::Disarmed) => STATE_ALARM_DISARMED,
        Some(PartitionState::ArmedStay) => STATE_ALARM_ARMED_HOME,
        Some(PartitionState::ArmedAway) => STATE_ALARM_ARMED_AWAY,
        Some(PartitionState::ArmedNight) => STATE_ALARM_ARMED_NIGHT,
        Some(PartitionState::Unknown) | None => STATE_MALFUNCTION,
    }
}

impl AlarmPanelEntity {
    pub fn code_format(&self) -> Option<CodeFormat> {
        self.code_guard().code_format()
    }

    pub async fn alarm_arm_night(&self, code: Option<&str>) -> Result<bool, ServiceError> {
        self.dispatch(PartitionCommand::ArmNight, code).await
    }

    pub async fn alarm_disarm(&self, code: Option<&str>) -> Result<bool, ServiceError> {
        self.dispatch(PartitionCommand::Disarm, code).await
    }

    /// Arm home, called "arm stay" by Alarm.com.
    pub async fn alarm_arm_home(&self, code: Option<&str>) -> Result<bool, ServiceError> {
        self.dispatch(PartitionCommand::ArmStay, code).await
    }

    pub async fn alarm_arm_away(&self, code: Option<&str>) -> Result<bool, ServiceError> {
        self.dispatch(PartitionCommand::ArmAway, code).await
    }
}

impl Entity for AlarmPanelEntity {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn entity_type(&self) -> EntityType {
        EntityType::AlarmControlPanel
    }

    fn name(&self) -> String {
        self.device_name()
    }

    fn state(&self) -> String {
        self.with_device(|d| map_partition_state(d.state, d.mismatched_states))
            .unwrap_or(STATE_MALFUNCTION)
            .into()
    }

    fn extra_state_attributes(&self) -> Map<String, Value> {
        let mut attributes = self.base_attributes();
        self.with_device(|d| {
            attributes.insert("mismatched_states".into(), d.mismatched_states.into());
            attributes.insert(
                "desired_state".into(),
                d.desired_state.map(|s| title_case(s.as_ref())).into(),
            );
            attributes.insert("uncleared_issues".into(), d.uncleared_issues.into());
        });
        attributes
    }

    fn supported_features(&self) -> u32 {
        ALARM_SUPPORT_ARM_HOME | ALARM_SUPPORT_ARM_AWAY | ALARM_SUPPORT_ARM_NIGHT
    }
}
