use std::fmt;

use crate::platform::{Arch, Os};

use super::{Formula, ReleaseTarget};

/// Renders a formula as a package-manager (Ruby) recipe.
///
/// ```
/// use stratus_installer::formula::{Formula, Homebrew};
///
/// let text = Homebrew(&Formula::builtin()).to_string();
/// assert!(text.starts_with("# typed: false"));
/// ```
pub struct Homebrew<'a>(pub &'a Formula);

impl Homebrew<'_> {
    fn class_name(&self) -> String {
        self.0
            .name
            .split(['-', '_'])
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect()
    }

    fn cpu_guard(os: Os, arch: Arch) -> &'static str {
        match (os, arch) {
            (_, Arch::X86_64) => "Hardware::CPU.intel?",
            (Os::MacOs, Arch::Arm64) => "Hardware::CPU.arm?",
            (Os::Linux, Arch::Arm64) => "Hardware::CPU.arm? && Hardware::CPU.is_64_bit?",
        }
    }

    fn write_target(&self, f: &mut fmt::Formatter<'_>, target: &ReleaseTarget) -> fmt::Result {
        writeln!(f, "    if {}", Self::cpu_guard(target.os, target.arch))?;
        writeln!(f, "      url \"{}\"", quote(&target.url))?;
        writeln!(f, "      sha256 \"{}\"", target.sha256)?;
        writeln!(f)?;
        writeln!(f, "      def install")?;
        writeln!(f, "        bin.install \"{}\"", quote(&self.0.binary))?;
        writeln!(f, "      end")?;
        writeln!(f, "    end")
    }
}

impl fmt::Display for Homebrew<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formula = self.0;

        writeln!(f, "# typed: false")?;
        writeln!(f, "# frozen_string_literal: true")?;
        writeln!(f)?;
        writeln!(f, "# This file was generated by stratus-installer. DO NOT EDIT.")?;
        writeln!(f, "class {} < Formula", self.class_name())?;
        writeln!(f, "  desc \"{}\"", quote(&formula.desc))?;
        writeln!(f, "  homepage \"{}\"", quote(&formula.homepage))?;
        writeln!(f, "  version \"{}\"", quote(&formula.version))?;
        writeln!(f, "  license \"{}\"", quote(&formula.license))?;

        for (os, block) in [(Os::MacOs, "on_macos"), (Os::Linux, "on_linux")] {
            let mut targets = formula.targets.iter().filter(|t| t.os == os).peekable();
            if targets.peek().is_none() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "  {} do", block)?;
            for target in targets {
                self.write_target(f, target)?;
            }
            writeln!(f, "  end")?;
        }

        writeln!(f, "end")
    }
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
