pub mod data;
pub mod installer;
pub mod utils;

use data::target::{PackageSource, VersionSpec};

pub const APP_NAME: &str = "hub-installer";

pub const DEFAULT_PACKAGE: &str = "jupyterhub";
pub const DEFAULT_ARCHIVE_HOST: &str = "github.com";
pub const DEFAULT_ARCHIVE_ORG: &str = "olaf-kucharski";
pub const DEFAULT_ARCHIVE_PROJECT: &str = "jupyterhub";

#[derive(Clone)]
pub struct Params<'a> {
    pub spec: &'a VersionSpec,
    pub source: &'a PackageSource,
    pub python: &'a str,
    pub dry_run: bool,
}
