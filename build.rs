// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");
}
