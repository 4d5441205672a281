// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Home-automation entities of the Alarm.com devices.
//!
//! Every entity is a [`DeviceEntity`] bound to one device record type. The record type fixes the
//! vendor state enum and the command set, the entity specific modules add the state mapping and
//! the command methods.

mod alarm_panel;
mod code;
mod cover;
mod lock;

pub use alarm_panel::*;
pub use code::*;
pub use cover::*;
pub use lock::*;

use crate::controller::{ControllerHandle, DeviceAction, DeviceRegistry, Devices};
use crate::errors::ServiceError;
use crate::vendor::VendorCommand;
use actix::Recipient;
use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strum::Display;

/// Reported when the true device state cannot be determined.
pub const STATE_MALFUNCTION: &str = "malfunction";
pub const STATE_UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    AlarmControlPanel,
    Cover,
    Lock,
}

/// State snapshot of an entity as presented to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub name: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    pub supported_features: u32,
    pub attributes: Map<String, Value>,
}

/// Host entity contract.
pub trait Entity {
    fn unique_id(&self) -> &str;

    fn entity_type(&self) -> EntityType;

    fn name(&self) -> String;

    fn state(&self) -> String;

    fn extra_state_attributes(&self) -> Map<String, Value>;

    fn supported_features(&self) -> u32 {
        0
    }

    fn device_class(&self) -> Option<&'static str> {
        None
    }

    fn entity_state(&self) -> EntityState {
        EntityState {
            entity_type: self.entity_type(),
            entity_id: self.unique_id().to_string(),
            name: self.name(),
            state: self.state(),
            device_class: self.device_class(),
            supported_features: self.supported_features(),
            attributes: self.extra_state_attributes(),
        }
    }
}

/// A device record in the registry which can be represented as entity.
pub trait DeviceRecord: Sized + 'static {
    type Command: VendorCommand;

    /// Registry table holding the records of this type.
    fn table(devices: &Devices) -> &BTreeMap<String, Self>;

    fn name(&self) -> &str;

    fn raw_state_text(&self) -> Option<&str>;
}

/// Entity of a single device: reads the shared registry and sends commands to the controller.
pub struct DeviceEntity<R: DeviceRecord> {
    unique_id: String,
    registry: DeviceRegistry,
    guard: CodeGuard,
    controller: Recipient<DeviceAction<R::Command>>,
}

impl<R: DeviceRecord> DeviceEntity<R> {
    pub fn new(
        unique_id: impl Into<String>,
        registry: DeviceRegistry,
        guard: CodeGuard,
        controller: Recipient<DeviceAction<R::Command>>,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            registry,
            guard,
            controller,
        }
    }

    pub fn code_guard(&self) -> &CodeGuard {
        &self.guard
    }

    /// Run `f` with the current device record.
    ///
    /// Returns `None` if the device is no longer in the registry.
    pub fn with_device<T>(&self, f: impl FnOnce(&R) -> T) -> Option<T> {
        let devices = self.registry.borrow();
        R::table(&devices).get(&self.unique_id).map(f)
    }

    fn device_name(&self) -> String {
        self.with_device(|d| d.name().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.unique_id.clone())
    }

    /// Attributes common to all entities.
    fn base_attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::with_capacity(4);
        if let Some(text) = self.with_device(|d| d.raw_state_text().map(String::from)).flatten() {
            attributes.insert("raw_state_text".into(), text.into());
        }
        attributes
    }

    /// Validate the access code and send the command to the controller.
    ///
    /// Returns `Ok(false)` without contacting the controller if the code doesn't match.
    pub async fn dispatch(
        &self,
        action: R::Command,
        code: Option<&str>,
    ) -> Result<bool, ServiceError> {
        if !self.guard.validate(code) {
            return Ok(false);
        }

        self.controller
            .send(DeviceAction {
                entity_id: self.unique_id.clone(),
                action,
            })
            .await?
    }
}

/// Create one entity per device of the record type.
fn setup_entities<R: DeviceRecord>(
    handle: &ControllerHandle,
    code: Option<&String>,
) -> Vec<DeviceEntity<R>> {
    let ids: Vec<String> = R::table(&handle.registry.borrow())
        .keys()
        .cloned()
        .collect();

    ids.into_iter()
        .map(|id| {
            debug!(
                "Initializing {} entity: {id}",
                <R::Command as VendorCommand>::DEVICE_TYPE.label()
            );
            DeviceEntity::new(
                id,
                handle.registry.clone(),
                CodeGuard::new(code.cloned()),
                handle.addr.clone().recipient(),
            )
        })
        .collect()
}
