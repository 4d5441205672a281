// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Common utility functions.

/// Title-case a text: every word starts with an uppercase letter, all other letters are lowercase.
///
/// A word starts after any non-alphabetic character, e.g. `ARMED_STAY` becomes `Armed_Stay`.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_alphabetic = false;
    for c in text.chars() {
        if prev_alphabetic {
            result.extend(c.to_lowercase());
        } else {
            result.extend(c.to_uppercase());
        }
        prev_alphabetic = c.is_alphabetic();
    }
    result
}
