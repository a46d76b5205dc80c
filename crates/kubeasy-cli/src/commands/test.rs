//! Test command - apply then validate in one shot

use std::path::Path;

use crate::commands::{apply, validate};
use crate::error::Result;
use crate::exit_codes;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    slug: &str,
    dir: &Path,
    clean: bool,
    fail_fast: bool,
    json: bool,
    timeout: u64,
) -> Result<i32> {
    // In JSON mode the apply phase stays quiet so stdout carries only
    // the validation document.
    let code = apply::run(slug, dir, clean, timeout, json).await?;
    if code != exit_codes::SUCCESS {
        return Ok(code);
    }

    validate::run(slug, dir, fail_fast, json, false, 0).await
}
