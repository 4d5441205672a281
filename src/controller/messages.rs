// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message definitions for the controller.

use crate::errors::ServiceError;
use actix::prelude::Message;

/// Send a command to a device.
///
/// The command type selects the device category. The result is the vendor's acceptance flag, or
/// `false` if the device is unknown or the account lacks the required permission.
#[derive(Debug)]
pub struct DeviceAction<C> {
    pub entity_id: String,
    pub action: C,
}

impl<C: Send + 'static> Message for DeviceAction<C> {
    type Result = Result<bool, ServiceError>;
}

/// Pull fresh device data from the API and replace the registry content.
#[derive(Debug, Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct RefreshDevices;

/// User facing notification which stays visible until dismissed.
#[derive(Debug, Clone, PartialEq, Message)]
#[rtype(result = "()")]
pub struct PersistentNotification {
    pub notification_id: String,
    pub title: String,
    pub message: String,
}
