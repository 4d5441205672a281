// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

pub mod controller;
pub mod entity;
pub mod service;
pub mod util;
pub mod vendor;

pub mod configuration;
pub mod errors;

pub use controller::*;
pub use service::*;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const APP_VERSION: &str = built_info::PKG_VERSION;
