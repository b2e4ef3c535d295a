use log::debug;

use crate::error::InstallError;
use crate::formula::{Formula, ReleaseTarget};

use super::HostPlatform;

/// Select the single release target matching the host.
///
/// Fails with [`InstallError::UnsupportedPlatform`] when the host has no
/// table key or the formula has no entry for it. There is no fallback entry.
#[tracing::instrument(skip(formula))]
pub fn resolve<'a>(
    formula: &'a Formula,
    host: &HostPlatform,
) -> Result<&'a ReleaseTarget, InstallError> {
    let platform = host.platform()?;
    debug!("Host {:?} maps to {}", host, platform);

    formula
        .target(platform)
        .ok_or_else(|| host.unsupported())
}
