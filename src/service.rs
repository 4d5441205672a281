// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Host command entry point.
//! Resolves the target entity of an `EntityCommand` and calls the matching entity method.

use crate::controller::ControllerHandle;
use crate::entity::{
    AlarmPanelEntity, CoverEntity, Entity, EntityState, LockEntity, setup_alarm_panels,
    setup_covers, setup_locks,
};
use crate::errors::ServiceError;
use log::info;
use serde::Deserialize;
use strum::{EnumString, VariantNames};

/// Command request of the host.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityCommand {
    pub entity_id: String,
    pub cmd_id: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum AlarmPanelService {
    AlarmArmHome,
    AlarmArmAway,
    AlarmArmNight,
    AlarmDisarm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum CoverService {
    OpenCover,
    CloseCover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum LockService {
    Lock,
    Unlock,
}

/// All entities of one controller.
#[derive(Default)]
pub struct Entities {
    pub alarm_panels: Vec<AlarmPanelEntity>,
    pub covers: Vec<CoverEntity>,
    pub locks: Vec<LockEntity>,
}

/// Borrowed entity of any type.
pub enum EntityRef<'a> {
    AlarmPanel(&'a AlarmPanelEntity),
    Cover(&'a CoverEntity),
    Lock(&'a LockEntity),
}

impl Entities {
    /// Create the entities of all devices known by the controller.
    pub fn setup(handle: &ControllerHandle) -> Self {
        let entities = Self {
            alarm_panels: setup_alarm_panels(handle),
            covers: setup_covers(handle),
            locks: setup_locks(handle),
        };
        info!(
            "Created {} alarm panel, {} cover and {} lock entities",
            entities.alarm_panels.len(),
            entities.covers.len(),
            entities.locks.len()
        );
        entities
    }

    pub fn states(&self) -> Vec<EntityState> {
        self.alarm_panels
            .iter()
            .map(Entity::entity_state)
            .chain(self.covers.iter().map(Entity::entity_state))
            .chain(self.locks.iter().map(Entity::entity_state))
            .collect()
    }

    pub fn find(&self, entity_id: &str) -> Option<EntityRef<'_>> {
        if let Some(e) = self.alarm_panels.iter().find(|e| e.unique_id() == entity_id) {
            return Some(EntityRef::AlarmPanel(e));
        }
        if let Some(e) = self.covers.iter().find(|e| e.unique_id() == entity_id) {
            return Some(EntityRef::Cover(e));
        }
        self.locks
            .iter()
            .find(|e| e.unique_id() == entity_id)
            .map(EntityRef::Lock)
    }
}

/// Call the entity method of the given command.
///
/// Returns `Ok(false)` if the command was not accepted, e.g. because of a wrong code.
pub async fn call_service(entities: &Entities, cmd: &EntityCommand) -> Result<bool, ServiceError> {
    info!("[{}] Calling service {}", cmd.entity_id, cmd.cmd_id);
    let code = cmd.code.as_deref();

    match entities.find(&cmd.entity_id) {
        None => Err(ServiceError::NotFound(format!(
            "Unknown entity: {}",
            cmd.entity_id
        ))),
        Some(EntityRef::AlarmPanel(entity)) => match cmd_from_str(&cmd.cmd_id)? {
            AlarmPanelService::AlarmArmHome => entity.alarm_arm_home(code).await,
            AlarmPanelService::AlarmArmAway => entity.alarm_arm_away(code).await,
            AlarmPanelService::AlarmArmNight => entity.alarm_arm_night(code).await,
            AlarmPanelService::AlarmDisarm => entity.alarm_disarm(code).await,
        },
        Some(EntityRef::Cover(entity)) => match cmd_from_str(&cmd.cmd_id)? {
            CoverService::OpenCover => entity.open_cover().await,
            CoverService::CloseCover => entity.close_cover().await,
        },
        Some(EntityRef::Lock(entity)) => match cmd_from_str(&cmd.cmd_id)? {
            LockService::Lock => entity.lock(code).await,
            LockService::Unlock => entity.unlock(code).await,
        },
    }
}

pub fn cmd_from_str<T: std::str::FromStr + VariantNames>(cmd: &str) -> Result<T, ServiceError> {
    T::from_str(cmd).map_err(|_| {
        ServiceError::BadRequest(format!(
            "Invalid cmd_id: {cmd}. Valid commands: {}",
            T::VARIANTS.to_vec().join(",")
        ))
    })
}
