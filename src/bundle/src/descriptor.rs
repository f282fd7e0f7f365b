//! Bundle descriptor synthesis from an OCI image.
//!
//! Produces the `bundle.conf` document for a bundle whose single component
//! runs an OCI image:
//!
//! - top-level sizing and identity fields (explicit values override defaults)
//! - `annotations` exploded from the image manifest's dotted keys
//! - one endpoint per exposed port of the image config
//! - an optional `<component>-status` component probing those endpoints

use conduct_core::error::{ConductError, Result};
use serde_json::Value;

use crate::args::ComponentArgs;
use crate::conf::{ConfObject, ConfValue};

/// File system type of the image-backed component.
pub const OCI_IMAGE_FILE_SYSTEM: &str = "oci-image";

/// File system type of the synthesized status-check component.
pub const UNIVERSAL_FILE_SYSTEM: &str = "universal";

/// Start command marker telling the orchestrator to run an image tag.
pub const OCI_IMAGE_TAG_COMMAND: &str = "ociImageTag";

/// Command run by the status-check component.
pub const CHECK_COMMAND: &str = "check";

pub const STATUS_COMPONENT_SUFFIX: &str = "-status";

pub const STATUS_COMPONENT_DESCRIPTION: &str = "Status check for the bundle component";

/// A network endpoint derived from an exposed `<port>/<protocol>` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub bind_protocol: String,
    pub bind_port: u16,
    pub service_name: String,
}

impl EndpointSpec {
    /// Parse an `ExposedPorts` key such as `8080/tcp`.
    pub fn parse(component_name: &str, port_key: &str) -> Result<Self> {
        let (port, protocol) = port_key.trim().split_once('/').ok_or_else(|| {
            ConductError::Format(format!(
                "exposed port '{}' is not of the form <port>/<protocol>",
                port_key
            ))
        })?;

        let bind_port: u16 = port.trim().parse().map_err(|_| {
            ConductError::Format(format!(
                "exposed port '{}' has an invalid port number",
                port_key
            ))
        })?;

        let bind_protocol = protocol.trim().to_lowercase();
        if bind_protocol.is_empty() {
            return Err(ConductError::Format(format!(
                "exposed port '{}' has no protocol",
                port_key
            )));
        }

        let service_name =
            format!("{}-{}-{}", component_name, bind_protocol, bind_port).to_lowercase();

        Ok(Self {
            bind_protocol,
            bind_port,
            service_name,
        })
    }

    /// Environment variable the orchestrator sets to this endpoint's host,
    /// e.g. `MY_COMPONENT_UDP_80_HOST`.
    pub fn host_env_var(&self) -> String {
        format!("{}_HOST", self.service_name.to_uppercase().replace('-', "_"))
    }

    fn to_conf(&self) -> ConfObject {
        let mut endpoint = ConfObject::new();
        endpoint.insert("bind-protocol", self.bind_protocol.clone().into());
        endpoint.insert("bind-port", u64::from(self.bind_port).into());
        endpoint.insert("service-name", self.service_name.clone().into());
        endpoint
    }
}

/// One entry of the `components` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentBlock {
    pub description: String,
    pub file_system_type: String,
    pub start_command: Vec<String>,
    pub endpoints: Vec<EndpointSpec>,
}

impl ComponentBlock {
    /// The component running the image tag.
    pub fn oci_image(description: &str, image_tag: &str, endpoints: Vec<EndpointSpec>) -> Self {
        Self {
            description: description.to_string(),
            file_system_type: OCI_IMAGE_FILE_SYSTEM.to_string(),
            start_command: vec![OCI_IMAGE_TAG_COMMAND.to_string(), image_tag.to_string()],
            endpoints,
        }
    }

    /// A component that checks every endpoint's host, in endpoint order.
    pub fn status_check(endpoints: &[EndpointSpec]) -> Self {
        let mut start_command = vec![CHECK_COMMAND.to_string()];
        start_command.extend(endpoints.iter().map(|e| format!("${}", e.host_env_var())));

        Self {
            description: STATUS_COMPONENT_DESCRIPTION.to_string(),
            file_system_type: UNIVERSAL_FILE_SYSTEM.to_string(),
            start_command,
            endpoints: Vec::new(),
        }
    }

    pub fn to_conf(&self) -> ConfObject {
        let mut endpoints = ConfObject::new();
        for endpoint in &self.endpoints {
            endpoints.insert(endpoint.service_name.clone(), endpoint.to_conf().into());
        }

        let mut component = ConfObject::new();
        component.insert("description", self.description.clone().into());
        component.insert("file-system-type", self.file_system_type.clone().into());
        component.insert(
            "start-command",
            ConfValue::string_list(self.start_command.iter().cloned()),
        );
        component.insert("endpoints", endpoints.into());
        component
    }
}

/// Endpoints for every `config.ExposedPorts` key of an image config,
/// ordered by port then protocol.
pub fn exposed_endpoints(component_name: &str, image_config: &Value) -> Result<Vec<EndpointSpec>> {
    ensure_object_or_null(image_config, "image config")?;

    let ports = match image_config.get("config").and_then(|c| c.get("ExposedPorts")) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(ports)) => ports,
        Some(other) => {
            return Err(ConductError::Format(format!(
                "config.ExposedPorts must be an object, got {}",
                other
            )))
        }
    };

    let mut endpoints = ports
        .keys()
        .map(|key| EndpointSpec::parse(component_name, key))
        .collect::<Result<Vec<_>>>()?;

    endpoints.sort_by(|a, b| {
        (a.bind_port, &a.bind_protocol).cmp(&(b.bind_port, &b.bind_protocol))
    });
    // `80/TCP` and `80/tcp` name the same service
    endpoints.dedup_by(|a, b| {
        let duplicate = a.service_name == b.service_name;
        if duplicate {
            tracing::warn!(service = %a.service_name, "Ignoring duplicate exposed port");
        }
        duplicate
    });

    Ok(endpoints)
}

/// Exploded annotations: manifest keys first (sorted), then `key=value`
/// arguments overriding them.
pub fn build_annotations(args: &ComponentArgs, manifest: &Value) -> Result<ConfObject> {
    ensure_object_or_null(manifest, "image manifest")?;

    let mut tree = ConfObject::new();

    match manifest.get("annotations") {
        None | Some(Value::Null) => {}
        Some(Value::Object(annotations)) => {
            let mut keys: Vec<&String> = annotations.keys().collect();
            keys.sort();
            for key in keys {
                tree.put_path(key, ConfValue::from_json(&annotations[key.as_str()]))?;
            }
        }
        Some(other) => {
            return Err(ConductError::Format(format!(
                "manifest annotations must be an object, got {}",
                other
            )))
        }
    }

    for annotation in &args.annotations {
        let (key, value) = match annotation.split_once('=') {
            Some((key, value)) => (key.trim(), ConfValue::String(value.to_string())),
            None => (annotation.trim(), ConfValue::Bool(true)),
        };
        tree.put_path(key, value)?;
    }

    Ok(tree)
}

/// Build the bundle descriptor for an image-backed component.
///
/// Fails without returning a partial document when the name is missing,
/// an exposed port key is malformed, or annotations collide.
pub fn build_descriptor(
    args: &ComponentArgs,
    component_name: &str,
    manifest: &Value,
    image_config: &Value,
) -> Result<ConfObject> {
    if args.name.trim().is_empty() {
        return Err(ConductError::Config("bundle name is required".to_string()));
    }
    if component_name.trim().is_empty() {
        return Err(ConductError::Config("component name is required".to_string()));
    }

    let annotations = build_annotations(args, manifest)?;

    let endpoints = if args.use_default_endpoints {
        exposed_endpoints(component_name, image_config)?
    } else {
        Vec::new()
    };

    let status = (args.use_default_check && args.use_default_endpoints && !endpoints.is_empty())
        .then(|| ComponentBlock::status_check(&endpoints));

    let mut components = ConfObject::new();
    components.insert(
        component_name,
        ComponentBlock::oci_image(&args.component_description, &args.image_tag, endpoints)
            .to_conf()
            .into(),
    );
    if let Some(status) = status {
        components.insert(
            format!("{}{}", component_name, STATUS_COMPONENT_SUFFIX),
            status.to_conf().into(),
        );
    }

    let mut descriptor = ConfObject::new();
    descriptor.insert("annotations", annotations.into());
    descriptor.insert("compatibilityVersion", args.compatibility_version_or_default());
    descriptor.insert("diskSpace", args.disk_space_or_default());
    descriptor.insert("memory", args.memory_or_default());
    descriptor.insert("name", args.name.clone().into());
    descriptor.insert("nrOfCpus", args.nr_of_cpus_or_default());
    descriptor.insert("roles", ConfValue::string_list(args.roles_or_default()));
    descriptor.insert("system", args.system_or_default());
    descriptor.insert("systemVersion", args.system_version_or_default());
    descriptor.insert("tags", ConfValue::string_list(args.tags_or_default()));
    descriptor.insert("version", args.version_or_default());
    descriptor.insert("components", components.into());

    tracing::debug!(
        bundle = %args.name,
        component = component_name,
        components = descriptor
            .get("components")
            .and_then(|c| c.as_object())
            .map(|c| c.len())
            .unwrap_or(0),
        "Built bundle descriptor"
    );

    Ok(descriptor)
}

/// [`build_descriptor`] rendered as `bundle.conf` text.
pub fn render_descriptor(
    args: &ComponentArgs,
    component_name: &str,
    manifest: &Value,
    image_config: &Value,
) -> Result<String> {
    build_descriptor(args, component_name, manifest, image_config).map(|d| d.render())
}

fn ensure_object_or_null(value: &Value, what: &str) -> Result<()> {
    if value.is_object() || value.is_null() {
        Ok(())
    } else {
        Err(ConductError::Format(format!(
            "{} must be a JSON object, got {}",
            what, value
        )))
    }
}
