use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use crate::{formula::Formula, runtime::Runtime};

/// Build a formula JSON from a release checksums listing
#[tracing::instrument(skip(runtime))]
pub fn generate<R: Runtime>(
    runtime: &R,
    version: &str,
    checksums_path: &Path,
    download_base: &str,
) -> Result<()> {
    let json = generate_json(runtime, version, checksums_path, download_base)?;
    println!("{}", json);
    Ok(())
}

fn generate_json<R: Runtime>(
    runtime: &R,
    version: &str,
    checksums_path: &Path,
    download_base: &str,
) -> Result<String> {
    let checksums = runtime
        .read_to_string(checksums_path)
        .with_context(|| format!("Failed to read checksums file {:?}", checksums_path))?;

    let formula = Formula::from_checksums(version, download_base, &checksums)?;
    info!(
        "Generated {} {} with {} target(s)",
        formula.name,
        formula.version,
        formula.targets.len()
    );
    formula.to_json_pretty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::DEFAULT_DOWNLOAD_BASE;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    #[test]
    fn test_generate_json_from_listing() {
        let listing = "\
c40414480e1ac3ad0e7192bf1626173b5c2531d76beb473f1dfbf7b5dceb22bf  stratus-red-team_1.3.0_Linux_x86_64.tar.gz
0000000000000000000000000000000000000000000000000000000000000000  stratus-red-team_1.3.0_Windows_x86_64.zip
";
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/tmp/checksums.txt")))
            .returning(move |_| Ok(listing.to_string()));

        let json = generate_json(
            &runtime,
            "v1.3.0",
            Path::new("/tmp/checksums.txt"),
            DEFAULT_DOWNLOAD_BASE,
        )
        .unwrap();

        let formula = Formula::from_json(&json).unwrap();
        assert_eq!(formula.version, "1.3.0");
        assert_eq!(formula.targets.len(), 1);
        assert_eq!(formula.targets[0], Formula::builtin().targets[3]);
    }

    #[test]
    fn test_generate_missing_listing_fails() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Err(anyhow::anyhow!("No such file or directory")));

        let err = generate(
            &runtime,
            "1.3.0",
            Path::new("/tmp/missing.txt"),
            DEFAULT_DOWNLOAD_BASE,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read checksums file"));
    }

    #[test]
    fn test_generate_listing_without_release_archives_fails() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("# nothing published\n".to_string()));

        assert!(
            generate_json(
                &runtime,
                "1.3.0",
                Path::new("/tmp/checksums.txt"),
                DEFAULT_DOWNLOAD_BASE,
            )
            .is_err()
        );
    }
}
