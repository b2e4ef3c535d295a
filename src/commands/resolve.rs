use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    formula::{Formula, ReleaseTarget},
    platform::{self, Arch, HostPlatform, Os},
    runtime::Runtime,
};

use super::load_formula;

/// Command-line replacements for parts of the detected host.
#[derive(Debug, Default, Clone)]
pub struct HostOverrides {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub bits: Option<u32>,
}

impl HostOverrides {
    /// Apply the overrides on top of `host`. Known aliases (`darwin`,
    /// `amd64`, ...) are normalized; anything else is kept verbatim so it
    /// can be reported as unsupported.
    pub fn apply(self, host: HostPlatform) -> HostPlatform {
        let os = match self.os {
            Some(os) => os.parse::<Os>().map(|os| os.to_string()).unwrap_or(os),
            None => host.os,
        };
        let arch = match self.arch {
            Some(arch) => arch
                .parse::<Arch>()
                .map(|arch| arch.to_string())
                .unwrap_or(arch),
            None => host.arch,
        };
        HostPlatform::new(os, arch, self.bits.unwrap_or(host.pointer_width))
    }
}

/// Print the release target selected for a host
#[tracing::instrument(skip(runtime, formula_path))]
pub fn resolve<R: Runtime>(
    runtime: &R,
    formula_path: Option<PathBuf>,
    overrides: HostOverrides,
) -> Result<()> {
    let formula = load_formula(runtime, formula_path.as_deref())?;
    let host = overrides.apply(HostPlatform::detect());
    debug!("Resolving for {:?}", host);

    let target = platform::resolve(&formula, &host)?;
    print!("{}", describe(&formula, target));
    Ok(())
}

fn describe(formula: &Formula, target: &ReleaseTarget) -> String {
    format!(
        "platform: {}\nurl:      {}\nsha256:   {}\nbinary:   {}\n",
        target.platform(),
        target.url,
        target.sha256,
        formula.binary
    )
}
