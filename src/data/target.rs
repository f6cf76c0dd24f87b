use std::{fmt, str::FromStr};

use crate::{
    data::errors::InstallerError, DEFAULT_ARCHIVE_HOST, DEFAULT_ARCHIVE_ORG,
    DEFAULT_ARCHIVE_PROJECT, DEFAULT_PACKAGE,
};

const GIT_PREFIX: &str = "git:";

/// What to install: a source-control reference or an exact release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Git(String),
    Release(String),
}

impl FromStr for VersionSpec {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(InstallerError::EmptyVersion);
        }
        // kept verbatim, pip rejects bad refs and versions
        match s.strip_prefix(GIT_PREFIX) {
            Some(git_ref) => Ok(VersionSpec::Git(git_ref.to_string())),
            None => Ok(VersionSpec::Release(s.to_string())),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Git(git_ref) => write!(f, "{GIT_PREFIX}{git_ref}"),
            VersionSpec::Release(version) => write!(f, "{version}"),
        }
    }
}

/// Where releases and source archives come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSource {
    pub package: String,
    pub archive_host: String,
    pub archive_org: String,
    pub archive_project: String,
}

impl Default for PackageSource {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            archive_host: DEFAULT_ARCHIVE_HOST.to_string(),
            archive_org: DEFAULT_ARCHIVE_ORG.to_string(),
            archive_project: DEFAULT_ARCHIVE_PROJECT.to_string(),
        }
    }
}

impl PackageSource {
    /// Resolves the install target handed to pip as its last argument.
    /// Git refs are substituted into the archive URL without escaping.
    pub fn resolve(&self, spec: &VersionSpec) -> String {
        match spec {
            VersionSpec::Git(git_ref) => format!(
                "https://{}/{}/{}/archive/{}.tar.gz",
                self.archive_host, self.archive_org, self.archive_project, git_ref
            ),
            VersionSpec::Release(version) => format!("{}=={}", self.package, version),
        }
    }
}
