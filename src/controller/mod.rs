// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Central controller of one Alarm.com account.
//!
//! The controller owns the vendor API client, keeps the shared device registry up to date and
//! dispatches entity commands to the API.

mod messages;
mod registry;

pub use messages::*;
pub use registry::*;

use crate::configuration::{ControllerSettings, EntryOptions, Settings};
use crate::errors::ServiceError;
use crate::vendor::{Action, AlarmApi, ApiError, VendorCommand};
use actix::prelude::{Actor, Context, Recipient};
use actix::{
    fut, ActorFutureExt, Addr, AsyncContext, Handler, ResponseActFuture, WrapFuture,
};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

/// Notification id of missing account permissions.
pub const PERMISSION_NOTIFICATION_ID: &str = "alarmcom_permission_error";

pub struct Controller {
    api: Rc<dyn AlarmApi>,
    /// Shared with all entities of the account
    devices: DeviceRegistry,
    settings: ControllerSettings,
    notifier: Option<Recipient<PersistentNotification>>,
}

/// Everything the entity setup functions need from a started controller.
#[derive(Clone)]
pub struct ControllerHandle {
    pub addr: Addr<Controller>,
    pub registry: DeviceRegistry,
    pub options: EntryOptions,
}

impl Controller {
    pub fn new(
        api: Rc<dyn AlarmApi>,
        devices: DeviceRegistry,
        settings: ControllerSettings,
        notifier: Option<Recipient<PersistentNotification>>,
    ) -> Self {
        Self {
            api,
            devices,
            settings,
            notifier,
        }
    }

    fn notify_permission_error(&self, action: Action) {
        let message = format!(
            "Your Alarm.com user does not have permission to {} your {}. Please log in to \
            Alarm.com to grant the appropriate permissions to your account.",
            action.to_string().to_lowercase(),
            action.device_type().label()
        );
        match &self.notifier {
            Some(notifier) => notifier.do_send(PersistentNotification {
                notification_id: PERMISSION_NOTIFICATION_ID.into(),
                title: "Alarm.com Error".into(),
                message,
            }),
            None => warn!("{message}"),
        }
    }
}

impl Actor for Controller {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("Controller started. {}", self.settings);
        ctx.run_interval(self.settings.update_interval, |_, ctx| {
            ctx.notify(RefreshDevices);
        });
    }
}

impl Handler<RefreshDevices> for Controller {
    type Result = ResponseActFuture<Self, Result<(), ServiceError>>;

    fn handle(&mut self, _: RefreshDevices, _ctx: &mut Self::Context) -> Self::Result {
        let api = self.api.clone();
        Box::pin(async move { api.update().await }.into_actor(self).map(
            |result, act, _ctx| match result {
                Ok(snapshot) => {
                    act.devices.borrow_mut().update(snapshot);
                    debug!("Device registry refreshed");
                    Ok(())
                }
                Err(e) => {
                    // keep the last known device data
                    warn!("Error communicating with API: {e}");
                    Err(ServiceError::UpdateFailed(e.to_string()))
                }
            },
        ))
    }
}

impl<C: VendorCommand> Handler<DeviceAction<C>> for Controller {
    type Result = ResponseActFuture<Self, Result<bool, ServiceError>>;

    fn handle(&mut self, msg: DeviceAction<C>, _ctx: &mut Self::Context) -> Self::Result {
        if !self.devices.borrow().contains(C::DEVICE_TYPE, &msg.entity_id) {
            warn!(
                "Ignoring {} command for unknown {}: {}",
                msg.action,
                C::DEVICE_TYPE.label(),
                msg.entity_id
            );
            return Box::pin(fut::ready(Ok(false)));
        }

        debug!("Sending {} command to {}", msg.action, msg.entity_id);
        let api = self.api.clone();
        let action = msg.action.into_action();
        let entity_id = msg.entity_id;

        Box::pin(
            async move { api.send_action(C::DEVICE_TYPE, action, entity_id).await }
                .into_actor(self)
                .map(move |result, act, ctx| match result {
                    Ok(accepted) => {
                        ctx.notify(RefreshDevices);
                        Ok(accepted)
                    }
                    Err(ApiError::PermissionDenied(reason)) => {
                        error!("Inadequate permissions. {reason}");
                        act.notify_permission_error(action);
                        Ok(false)
                    }
                    Err(e) => Err(e.into()),
                }),
        )
    }
}

/// Log in to the account, fetch the initial device data and start the controller actor.
///
/// Must be called from within a running actix system.
pub async fn start_controller(
    settings: &Settings,
    api: Rc<dyn AlarmApi>,
    notifier: Option<Recipient<PersistentNotification>>,
) -> Result<ControllerHandle, ServiceError> {
    debug!(
        "Setting up controller for account {}",
        settings.account.username
    );

    match tokio::time::timeout(
        settings.controller.login_timeout,
        api.login(settings.credentials()),
    )
    .await
    {
        Err(_) => return Err(ServiceError::NotReady("Login timeout".into())),
        Ok(Err(e)) => {
            debug!("Login failed: {e}");
            return Err(e.into());
        }
        Ok(Ok(())) => {}
    }

    // Fetch initial data so we have data when entities are created.
    let snapshot = api
        .update()
        .await
        .map_err(|e| ServiceError::NotReady(e.to_string()))?;
    let registry = Rc::new(RefCell::new(Devices::from_snapshot(snapshot)));

    let addr = Controller::new(api, registry.clone(), settings.controller, notifier).start();

    Ok(ControllerHandle {
        addr,
        registry,
        options: settings.options.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::AccountSettings;
    use crate::vendor::{
        AccountSnapshot, Credentials, DeviceType, Lock, LockCommand, LockState, Partition,
        PartitionCommand, PartitionState, SnapshotApi,
    };
    use futures::FutureExt;
    use futures::future::{LocalBoxFuture, pending, ready};
    use std::time::Duration;

    /// API with a switchable connection, optionally never answering the login.
    #[derive(Default)]
    struct FlakyApi {
        account: AccountSnapshot,
        offline: RefCell<bool>,
        hanging_login: bool,
    }

    impl AlarmApi for FlakyApi {
        fn login(&self, _: Credentials) -> LocalBoxFuture<'_, Result<(), ApiError>> {
            if self.hanging_login {
                FutureExt::boxed_local(pending())
            } else {
                FutureExt::boxed_local(ready(Ok(())))
            }
        }

        fn update(&self) -> LocalBoxFuture<'_, Result<AccountSnapshot, ApiError>> {
            let result = if *self.offline.borrow() {
                Err(ApiError::Connection("offline".into()))
            } else {
                Ok(self.account.clone())
            };
            FutureExt::boxed_local(ready(result))
        }

        fn send_action(
            &self,
            _: DeviceType,
            _: Action,
            _: String,
        ) -> LocalBoxFuture<'_, Result<bool, ApiError>> {
            FutureExt::boxed_local(ready(Ok(true)))
        }
    }

    #[derive(Default)]
    struct NotificationSink {
        received: Rc<RefCell<Vec<PersistentNotification>>>,
    }

    impl Actor for NotificationSink {
        type Context = Context<Self>;
    }

    impl Handler<PersistentNotification> for NotificationSink {
        type Result = ();

        fn handle(&mut self, msg: PersistentNotification, _: &mut Self::Context) {
            self.received.borrow_mut().push(msg);
        }
    }

    fn settings() -> Settings {
        Settings {
            account: AccountSettings {
                username: "joe".into(),
                password: "secret".into(),
                two_factor_cookie: None,
            },
            ..Default::default()
        }
    }

    fn account() -> AccountSnapshot {
        AccountSnapshot {
            partitions: vec![Partition {
                id: "p1".into(),
                name: "House".into(),
                state: Some(PartitionState::Disarmed),
                ..Default::default()
            }],
            locks: vec![Lock {
                id: "l1".into(),
                name: "Front door".into(),
                state: Some(LockState::Unlocked),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[actix::test]
    async fn start_controller_loads_initial_devices() {
        let api = Rc::new(SnapshotApi::new(account()));
        let handle = start_controller(&settings(), api, None).await.unwrap();

        let devices = handle.registry.borrow();
        assert!(devices.partitions.contains_key("p1"));
        assert!(devices.locks.contains_key("l1"));
    }

    #[actix::test]
    async fn start_controller_with_invalid_credentials_fails() {
        let api = Rc::new(SnapshotApi::new(account()));
        let mut cfg = settings();
        cfg.account.username = String::new();

        let result = start_controller(&cfg, api, None).await;
        assert_eq!(Some(ServiceError::AuthenticationFailed), result.err());
    }

    #[actix::test]
    async fn command_for_unknown_device_is_not_sent() {
        let api = Rc::new(SnapshotApi::new(account()));
        let handle = start_controller(&settings(), api.clone(), None)
            .await
            .unwrap();

        let result = handle
            .addr
            .send(DeviceAction {
                entity_id: "p1".into(),
                action: LockCommand::Lock,
            })
            .await
            .unwrap();

        assert_eq!(Ok(false), result, "Partition id must not be accepted as lock");
        assert!(api.sent_actions().is_empty());
    }

    #[actix::test]
    async fn command_is_sent_and_registry_refreshed() {
        let api = Rc::new(SnapshotApi::new(account()));
        let handle = start_controller(&settings(), api.clone(), None)
            .await
            .unwrap();

        let result = handle
            .addr
            .send(DeviceAction {
                entity_id: "p1".into(),
                action: PartitionCommand::ArmAway,
            })
            .await
            .unwrap();
        assert_eq!(Ok(true), result);
        assert_eq!(
            vec![(
                DeviceType::Partition,
                Action::Partition(PartitionCommand::ArmAway),
                "p1".to_string()
            )],
            api.sent_actions()
        );

        // the refresh is queued behind the command, an explicit refresh is handled after it
        handle.addr.send(RefreshDevices).await.unwrap().unwrap();
        assert_eq!(
            Some(PartitionState::ArmedAway),
            handle.registry.borrow().partitions["p1"].state
        );
    }

    #[actix::test]
    async fn permission_error_creates_notification() {
        let api = Rc::new(SnapshotApi::new(account()).read_only(true));
        let sink = NotificationSink::default();
        let received = sink.received.clone();
        let sink = sink.start();

        let handle = start_controller(&settings(), api, Some(sink.clone().recipient()))
            .await
            .unwrap();

        let result = handle
            .addr
            .send(DeviceAction {
                entity_id: "l1".into(),
                action: LockCommand::Unlock,
            })
            .await
            .unwrap();
        assert_eq!(Ok(false), result);

        // process the pending notification
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let received = received.borrow();
        assert_eq!(1, received.len());
        assert_eq!(PERMISSION_NOTIFICATION_ID, received[0].notification_id);
        assert!(
            received[0].message.contains("unlock your lock"),
            "Unexpected message: {}",
            received[0].message
        );
    }

    #[actix::test]
    async fn failed_refresh_keeps_last_devices() {
        let api = Rc::new(FlakyApi {
            account: account(),
            ..Default::default()
        });
        let handle = start_controller(&settings(), api.clone(), None)
            .await
            .unwrap();
        let before = handle.registry.borrow().clone();

        api.offline.replace(true);
        let result = handle.addr.send(RefreshDevices).await.unwrap();

        assert_eq!(
            Err(ServiceError::UpdateFailed("Cannot connect: offline".into())),
            result
        );
        assert_eq!(before, *handle.registry.borrow());
        assert!(handle.registry.borrow().locks.contains_key("l1"));
    }

    #[actix::test]
    async fn login_timeout_is_not_ready() {
        let api = Rc::new(FlakyApi {
            account: account(),
            hanging_login: true,
            ..Default::default()
        });
        let mut cfg = settings();
        cfg.controller.login_timeout = Duration::from_millis(50);

        let result = start_controller(&cfg, api, None).await;

        assert_eq!(
            Some(ServiceError::NotReady("Login timeout".into())),
            result.err()
        );
    }

    #[actix::test]
    async fn unreachable_account_is_not_ready() {
        let api = Rc::new(FlakyApi {
            account: account(),
            offline: RefCell::new(true),
            ..Default::default()
        });

        let result = start_controller(&settings(), api, None).await;

        assert_eq!(
            Some(ServiceError::NotReady("Cannot connect: offline".into())),
            result.err()
        );
    }
}
