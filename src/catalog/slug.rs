use crate::catalog_store::normalize::slugify;
use crate::error::{ServiceError, ServiceResult};
use rand::{distr::Alphanumeric, Rng};
use tracing::debug;

const SLUG_SUFFIX_LENGTH: usize = 6;
const MAX_SLUG_ATTEMPTS: usize = 8;

fn random_suffix() -> String {
    let rng = rand::rng();
    rng.sample_iter(&Alphanumeric)
        .take(SLUG_SUFFIX_LENGTH)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// Slug for `name` that `is_taken` reports as free. On collision a dash and
/// a short random suffix are appended. Names without any alphanumeric fall
/// back to `fallback`.
pub fn unique_slug<F>(name: &str, fallback: &str, is_taken: F) -> ServiceResult<String>
where
    F: Fn(&str) -> anyhow::Result<bool>,
{
    let mut base = slugify(name);
    if base.is_empty() {
        base = fallback.to_string();
    }
    if !is_taken(&base)? {
        return Ok(base);
    }

    for _ in 0..MAX_SLUG_ATTEMPTS {
        let candidate = format!("{}-{}", base, random_suffix());
        if !is_taken(&candidate)? {
            debug!("Slug {} taken, using {}", base, candidate);
            return Ok(candidate);
        }
    }
    Err(ServiceError::Conflict(format!(
        "Could not find a free slug for {}",
        base
    )))
}
