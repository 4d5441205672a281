// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use std::path::Path;
use std::rc::Rc;

use adc_intg::configuration::{DEF_CONFIG_FILE, get_configuration};
use adc_intg::vendor::SnapshotApi;
use adc_intg::{
    APP_VERSION, Entities, EntityCommand, RefreshDevices, built_info, call_service,
    start_controller,
};
use anyhow::{Context, anyhow};
use clap::{Command, arg};
use log::info;

const DEF_SNAPSHOT_FILE: &str = "snapshot.json";

#[actix::main]
async fn main() -> anyhow::Result<()> {
    let args = Command::new(built_info::PKG_NAME)
        .author("Unfolded Circle Aps")
        .version(APP_VERSION)
        .about("Alarm.com alarm panel, garage door and lock entities")
        .arg(arg!(-c --config <FILE> "Configuration file").required(false))
        .arg(arg!(-s --snapshot <FILE> "Alarm.com account snapshot file").required(false))
        .subcommand_required(true)
        .subcommand(Command::new("states").about("Print the state of all entities"))
        .subcommand(
            Command::new("command")
                .about("Send a command to an entity")
                .arg(arg!(<ENTITY_ID> "Entity identifier"))
                .arg(arg!(<CMD_ID> "Command name, e.g. alarm_disarm or open_cover"))
                .arg(arg!(--code <CODE> "Access code").required(false)),
        )
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.get_one::<String>("config") {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {}", DEF_CONFIG_FILE);
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c.as_str()),
    };
    let cfg = get_configuration(cfg_file).context("Failed to read configuration")?;

    let snapshot_file = args
        .get_one::<String>("snapshot")
        .map(String::as_str)
        .unwrap_or(DEF_SNAPSHOT_FILE);
    let api = SnapshotApi::from_file(snapshot_file)
        .with_context(|| format!("Failed to load snapshot file {snapshot_file}"))?;

    let handle = start_controller(&cfg, Rc::new(api), None)
        .await
        .map_err(|e| anyhow!("Alarm.com setup failed: {e}"))?;
    let entities = Entities::setup(&handle);

    if let Some(("command", sub)) = args.subcommand() {
        let cmd = EntityCommand {
            entity_id: sub
                .get_one::<String>("ENTITY_ID")
                .cloned()
                .unwrap_or_default(),
            cmd_id: sub.get_one::<String>("CMD_ID").cloned().unwrap_or_default(),
            code: sub.get_one::<String>("code").cloned(),
        };
        let accepted = call_service(&entities, &cmd)
            .await
            .map_err(|e| anyhow!("{e}"))?;
        info!("Command {} accepted: {accepted}", cmd.cmd_id);

        handle
            .addr
            .send(RefreshDevices)
            .await?
            .map_err(|e| anyhow!("{e}"))?;
    }

    println!("{}", serde_json::to_string_pretty(&entities.states())?);

    Ok(())
}
