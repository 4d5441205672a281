// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Static access code check for entity commands.

use log::warn;
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use strum::Display;

/// Input format hint of the access code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CodeFormat {
    Number,
    Text,
}

/// Gate for commands requiring a configured access code.
///
/// Without a configured code every command passes.
#[derive(Clone, Default)]
pub struct CodeGuard {
    code: Option<String>,
}

impl CodeGuard {
    pub fn new(code: Option<String>) -> Self {
        Self { code }
    }

    /// Guard which accepts every command.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.code.is_some()
    }

    /// Compare the given code with the configured code.
    pub fn validate(&self, code: Option<&str>) -> bool {
        let check = match self.code.as_deref() {
            None => true,
            Some(expected) => code == Some(expected),
        };
        if !check {
            warn!("Wrong code entered");
        }
        check
    }

    /// `Number` if the configured code only consists of digits, `Text` otherwise.
    pub fn code_format(&self) -> Option<CodeFormat> {
        self.code.as_deref().map(|code| {
            if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
                CodeFormat::Number
            } else {
                CodeFormat::Text
            }
        })
    }
}

impl Debug for CodeGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // don't expose the code
        f.debug_struct("CodeGuard")
            .field("configured", &self.is_configured())
            .finish()
    }
}
