// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use crate::model::KeyEntry;

/// An Ed25519 key entry whose comment is derived from its material.
pub(crate) fn entry(key_material: &str) -> KeyEntry {
    KeyEntry {
        key_type: "ssh-ed25519".to_owned(),
        key_material: key_material.to_owned(),
        comment: format!("{key_material}@example"),
    }
}
