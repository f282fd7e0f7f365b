//! Component metadata supplied on the command line.

use crate::conf::ConfValue;

/// Default bundle version.
pub const DEFAULT_VERSION: &str = "1";

/// Default compatibility version.
pub const DEFAULT_COMPATIBILITY_VERSION: &str = "0";

/// Default system version.
pub const DEFAULT_SYSTEM_VERSION: &str = "1";

/// Default CPU share.
pub const DEFAULT_NR_OF_CPUS: f64 = 0.1;

/// Default memory in bytes (384 MiB).
pub const DEFAULT_MEMORY: u64 = 402_653_184;

/// Default disk space in bytes (1 GiB).
pub const DEFAULT_DISK_SPACE: u64 = 1_073_741_824;

/// Default roles.
pub const DEFAULT_ROLES: &[&str] = &["web"];

/// Image tag that is never copied into the bundle tags.
pub const FLOATING_IMAGE_TAG: &str = "latest";

/// Metadata describing the bundle and its image-backed component.
///
/// Optional scalar fields hold the caller's value as-is: a `memory` given as
/// the string `"65536"` is written quoted, while the default is a bare
/// number. `None` means "use the default".
#[derive(Debug, Clone, Default)]
pub struct ComponentArgs {
    /// Bundle name
    pub name: String,

    /// Description of the image component
    pub component_description: String,

    /// Image tag started by the component
    pub image_tag: String,

    /// Generate endpoints from the image's exposed ports
    pub use_default_endpoints: bool,

    /// Generate a status-check component probing those endpoints
    pub use_default_check: bool,

    /// `key=value` annotations; a bare `key` is set to `true`
    pub annotations: Vec<String>,

    /// Bundle tags (defaults to the image tag)
    pub tags: Vec<String>,

    /// Roles (defaults to `["web"]`)
    pub roles: Option<Vec<String>>,

    pub version: Option<ConfValue>,
    pub compatibility_version: Option<ConfValue>,
    pub system: Option<ConfValue>,
    pub system_version: Option<ConfValue>,
    pub nr_of_cpus: Option<ConfValue>,
    pub memory: Option<ConfValue>,
    pub disk_space: Option<ConfValue>,
}

impl ComponentArgs {
    pub fn new(
        name: impl Into<String>,
        component_description: impl Into<String>,
        image_tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            component_description: component_description.into(),
            image_tag: image_tag.into(),
            use_default_endpoints: true,
            ..Default::default()
        }
    }

    pub fn version_or_default(&self) -> ConfValue {
        self.version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.into())
    }

    pub fn compatibility_version_or_default(&self) -> ConfValue {
        self.compatibility_version
            .clone()
            .unwrap_or_else(|| DEFAULT_COMPATIBILITY_VERSION.into())
    }

    /// The system defaults to the bundle name.
    pub fn system_or_default(&self) -> ConfValue {
        self.system
            .clone()
            .unwrap_or_else(|| self.name.clone().into())
    }

    pub fn system_version_or_default(&self) -> ConfValue {
        self.system_version
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_VERSION.into())
    }

    pub fn nr_of_cpus_or_default(&self) -> ConfValue {
        self.nr_of_cpus
            .clone()
            .unwrap_or_else(|| ConfValue::float(DEFAULT_NR_OF_CPUS))
    }

    pub fn memory_or_default(&self) -> ConfValue {
        self.memory
            .clone()
            .unwrap_or_else(|| DEFAULT_MEMORY.into())
    }

    pub fn disk_space_or_default(&self) -> ConfValue {
        self.disk_space
            .clone()
            .unwrap_or_else(|| DEFAULT_DISK_SPACE.into())
    }

    pub fn roles_or_default(&self) -> Vec<String> {
        match &self.roles {
            Some(roles) => roles.clone(),
            None => DEFAULT_ROLES.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Explicit tags, or the image tag unless it is the floating `latest`.
    pub fn tags_or_default(&self) -> Vec<String> {
        if !self.tags.is_empty() {
            return self.tags.clone();
        }
        if self.image_tag.is_empty() || self.image_tag == FLOATING_IMAGE_TAG {
            return Vec::new();
        }
        vec![self.image_tag.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = ComponentArgs::new("world", "desc", "testing");

        assert_eq!(args.version_or_default(), "1".into());
        assert_eq!(args.compatibility_version_or_default(), "0".into());
        assert_eq!(args.system_or_default(), "world".into());
        assert_eq!(args.system_version_or_default(), "1".into());
        assert_eq!(args.nr_of_cpus_or_default(), ConfValue::float(0.1));
        assert_eq!(args.memory_or_default(), 402653184u64.into());
        assert_eq!(args.disk_space_or_default(), 1073741824u64.into());
        assert_eq!(args.roles_or_default(), vec!["web".to_string()]);
        assert_eq!(args.tags_or_default(), vec!["testing".to_string()]);
    }

    #[test]
    fn test_explicit_values_keep_their_type() {
        let args = ComponentArgs {
            nr_of_cpus: Some("8".into()),
            memory: Some(65536u64.into()),
            ..ComponentArgs::new("world", "desc", "testing")
        };

        assert_eq!(args.nr_of_cpus_or_default(), ConfValue::String("8".to_string()));
        assert_eq!(args.memory_or_default(), 65536u64.into());
    }

    #[test]
    fn test_tags_skip_latest() {
        let args = ComponentArgs::new("world", "desc", "latest");
        assert!(args.tags_or_default().is_empty());
    }

    #[test]
    fn test_explicit_tags_win() {
        let args = ComponentArgs {
            tags: vec!["1.0.0".to_string()],
            ..ComponentArgs::new("world", "desc", "testing")
        };
        assert_eq!(args.tags_or_default(), vec!["1.0.0".to_string()]);
    }

    #[test]
    fn test_explicit_empty_roles_stay_empty() {
        let args = ComponentArgs {
            roles: Some(Vec::new()),
            ..ComponentArgs::new("world", "desc", "testing")
        };
        assert!(args.roles_or_default().is_empty());
    }
}
