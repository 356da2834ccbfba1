// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::trace;
use ssh_key::Algorithm;

use crate::model::KeyEntry;

/// Reports whether `token` names an SSH public key or certificate algorithm.
fn is_key_type(token: &str) -> bool {
    [Algorithm::new(token), Algorithm::new_certificate(token)]
        .iter()
        .any(|algorithm| matches!(algorithm, Ok(known) if !matches!(known, Algorithm::Other(_))))
}

/// Splits a leading options field (such as `from="10.0.0.0/8",no-pty`) off of
/// a line. Whitespace inside double quotes belongs to the options.
fn split_options(line: &str) -> &str {
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => return &line[i..],
            _ => {}
        }
    }
    ""
}

fn parse_line(line: &str) -> Option<KeyEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let first = line.split_whitespace().next()?;
    let rest = if is_key_type(first) {
        line
    } else {
        split_options(line)
    };

    let mut tokens = rest.split_whitespace();
    let key_type = tokens.next().filter(|token| is_key_type(token))?;
    let key_material = tokens.next()?;
    Some(KeyEntry {
        key_type: key_type.to_owned(),
        key_material: key_material.to_owned(),
        comment: tokens.collect::<Vec<_>>().join(" "),
    })
}

/// Extracts the keys from the contents of an authorized keys file, in file
/// order. Lines that are not keys are skipped.
pub(crate) fn parse(raw: &str) -> Vec<KeyEntry> {
    raw.lines()
        .filter_map(|line| {
            let entry = parse_line(line);
            if entry.is_none() && !line.trim().is_empty() {
                trace!("Skipping line that does not hold a key: {}", line);
            }
            entry
        })
        .collect()
}
