// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::{error::Result, storage};

pub(crate) mod query;
pub(crate) mod scan;

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, storage: storage::File) -> Result<()>;
}
