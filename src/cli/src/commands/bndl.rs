//! `conduct bndl` command: turn an exported OCI image into a bundle.

use std::path::PathBuf;

use clap::Args;
use conduct_bundle::args::FLOATING_IMAGE_TAG;
use conduct_bundle::{
    locate_and_extract, render_descriptor, write_bundle, ComponentArgs, ConfValue, OciImage,
};
use conduct_core::error::ConductError;

#[derive(Args, Debug, Clone)]
pub struct BndlArgs {
    /// OCI image layout directory, or a tar archive containing one
    pub source: PathBuf,

    /// Bundle archive to write (default: <name>.tgz)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Bundle name
    #[arg(long)]
    pub name: String,

    /// Name of the image component (default: the bundle name)
    #[arg(long)]
    pub component_name: Option<String>,

    /// Description of the image component (default: the bundle name)
    #[arg(long)]
    pub component_description: Option<String>,

    /// Image tag to start (default: the layout's ref name, else "latest")
    #[arg(long)]
    pub image_tag: Option<String>,

    #[arg(long)]
    pub version: Option<String>,

    #[arg(long)]
    pub compatibility_version: Option<String>,

    #[arg(long)]
    pub system: Option<String>,

    #[arg(long)]
    pub system_version: Option<String>,

    #[arg(long)]
    pub nr_of_cpus: Option<String>,

    #[arg(long)]
    pub memory: Option<String>,

    #[arg(long)]
    pub disk_space: Option<String>,

    /// Role the bundle requires (repeatable, default: web)
    #[arg(long = "role")]
    pub roles: Vec<String>,

    /// Bundle tag (repeatable, default: the image tag)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Annotation as key=value, or a bare key for `true` (repeatable)
    #[arg(long = "annotation")]
    pub annotations: Vec<String>,

    /// Do not generate endpoints from the image's exposed ports
    #[arg(long)]
    pub no_default_endpoints: bool,

    /// Add a status-check component probing the generated endpoints
    #[arg(long)]
    pub with_check: bool,
}

impl BndlArgs {
    fn component_name(&self) -> String {
        self.component_name.clone().unwrap_or_else(|| self.name.clone())
    }

    fn component_args(&self, ref_name: Option<&str>) -> ComponentArgs {
        let image_tag = self
            .image_tag
            .as_deref()
            .or(ref_name)
            .unwrap_or(FLOATING_IMAGE_TAG);
        let description = self.component_description.as_deref().unwrap_or(&self.name);
        let text = |value: &Option<String>| value.clone().map(ConfValue::String);

        ComponentArgs {
            use_default_endpoints: !self.no_default_endpoints,
            use_default_check: self.with_check,
            annotations: self.annotations.clone(),
            tags: self.tags.clone(),
            roles: (!self.roles.is_empty()).then(|| self.roles.clone()),
            version: text(&self.version),
            compatibility_version: text(&self.compatibility_version),
            system: text(&self.system),
            system_version: text(&self.system_version),
            nr_of_cpus: text(&self.nr_of_cpus),
            memory: text(&self.memory),
            disk_space: text(&self.disk_space),
            ..ComponentArgs::new(self.name.clone(), description, image_tag)
        }
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.tgz", self.name)))
    }
}

pub async fn execute(args: BndlArgs) -> Result<(), Box<dyn std::error::Error>> {
    let output = bundle_image(&args)?;
    println!("Bundle written to {}", output.display());
    Ok(())
}

/// Locate and unpack the layout, synthesize `bundle.conf`, and package both.
fn bundle_image(args: &BndlArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let work = tempfile::TempDir::new()?;
    let layout_dir = work.path().join("layout");

    if !locate_and_extract(&layout_dir, &args.source, args.source.is_dir())? {
        return Err(ConductError::OciImage(format!(
            "no oci-layout found in {}",
            args.source.display()
        ))
        .into());
    }

    let image = OciImage::open(&layout_dir)?;
    let component_name = args.component_name();
    let component_args = args.component_args(image.ref_name());
    let bundle_conf = render_descriptor(
        &component_args,
        &component_name,
        image.manifest(),
        image.config(),
    )?;

    let output = write_bundle(
        &args.output_path(),
        &args.name,
        &component_name,
        &bundle_conf,
        &layout_dir,
    )?;

    tracing::info!(output = %output.display(), bundle = %args.name, "Created bundle");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Command};
    use clap::Parser;
    use flate2::read::GzDecoder;
    use serde_json::json;
    use std::fs;
    use std::io::Read;
    use std::path::Path;
    use tempfile::TempDir;

    const MANIFEST_HEX: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const CONFIG_HEX: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn write_image(dir: &Path) {
        let blobs = dir.join("blobs").join("sha256");
        fs::create_dir_all(&blobs).unwrap();
        fs::write(dir.join("oci-layout"), r#"{"imageLayoutVersion":"1.0.0"}"#).unwrap();
        fs::write(
            blobs.join(CONFIG_HEX),
            json!({"config": {"ExposedPorts": {"80/tcp": {}}}}).to_string(),
        )
        .unwrap();
        fs::write(
            blobs.join(MANIFEST_HEX),
            json!({
                "schemaVersion": 2,
                "config": {
                    "mediaType": "application/vnd.oci.image.config.v1+json",
                    "digest": format!("sha256:{CONFIG_HEX}"),
                    "size": 10
                },
                "layers": [],
                "annotations": {"description": "hello"}
            })
            .to_string(),
        )
        .unwrap();
        fs::write(
            dir.join("index.json"),
            json!({
                "schemaVersion": 2,
                "manifests": [{
                    "mediaType": "application/vnd.oci.image.manifest.v1+json",
                    "digest": format!("sha256:{MANIFEST_HEX}"),
                    "size": 10,
                    "annotations": {"org.opencontainers.image.ref.name": "2.0.1"}
                }]
            })
            .to_string(),
        )
        .unwrap();
    }

    fn parse(args: &[&str]) -> BndlArgs {
        let mut argv = vec!["conduct", "bndl"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Bndl(args) => args,
            _ => panic!("expected bndl"),
        }
    }

    fn read_entry(archive: &Path, wanted: &str) -> Option<String> {
        let mut archive = tar::Archive::new(GzDecoder::new(fs::File::open(archive).unwrap()));
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            if entry.path().unwrap().to_string_lossy() == wanted {
                let mut content = String::new();
                entry.read_to_string(&mut content).unwrap();
                return Some(content);
            }
        }
        None
    }

    #[test]
    fn test_component_args_defaults() {
        let args = parse(&["image", "--name", "world"]);
        let component = args.component_args(None);

        assert_eq!(component.image_tag, "latest");
        assert_eq!(component.component_description, "world");
        assert!(component.use_default_endpoints);
        assert!(!component.use_default_check);
        assert!(component.roles.is_none());
        assert!(component.memory.is_none());
        assert_eq!(args.component_name(), "world");
        assert_eq!(args.output_path(), PathBuf::from("world.tgz"));
    }

    #[test]
    fn test_component_args_overrides() {
        let args = parse(&[
            "image",
            "--name",
            "world",
            "--image-tag",
            "3.0",
            "--memory",
            "65536",
            "--role",
            "web",
            "--role",
            "backend",
            "--annotation",
            "a.b=c",
            "--no-default-endpoints",
            "--with-check",
        ]);
        let component = args.component_args(Some("2.0.1"));

        assert_eq!(component.image_tag, "3.0");
        assert_eq!(component.memory, Some(ConfValue::String("65536".to_string())));
        assert_eq!(
            component.roles,
            Some(vec!["web".to_string(), "backend".to_string()])
        );
        assert_eq!(component.annotations, vec!["a.b=c".to_string()]);
        assert!(!component.use_default_endpoints);
        assert!(component.use_default_check);
    }

    #[test]
    fn test_bundle_image_from_directory() {
        let work = TempDir::new().unwrap();
        let source = work.path().join("export");
        write_image(&source.join("nested"));
        let output = work.path().join("out").join("world.tgz");

        let args = parse(&[
            source.to_str().unwrap(),
            "--name",
            "world",
            "--component-name",
            "web",
            "-o",
            output.to_str().unwrap(),
        ]);
        let written = bundle_image(&args).unwrap();
        assert_eq!(written, output);

        let conf = read_entry(&output, "world/bundle.conf").unwrap();
        assert!(conf.starts_with("annotations {\n  description = \"hello\"\n}"));
        assert!(conf.contains("tags = [\n  \"2.0.1\"\n]"));
        assert!(conf.contains("      \"2.0.1\"\n    ]"));
        assert!(conf.contains("web-tcp-80 {"));
        assert!(read_entry(&output, "world/web/oci-layout").is_some());
        assert!(read_entry(&output, "world/web/index.json").is_some());
    }

    #[test]
    fn test_bundle_image_from_tar() {
        let work = TempDir::new().unwrap();
        let image_dir = work.path().join("image");
        write_image(&image_dir);

        let tar_path = work.path().join("image.tar");
        let mut builder = tar::Builder::new(fs::File::create(&tar_path).unwrap());
        builder.append_dir_all("prefix", &image_dir).unwrap();
        builder.into_inner().unwrap();

        let output = work.path().join("world.tgz");
        let args = parse(&[
            tar_path.to_str().unwrap(),
            "--name",
            "world",
            "-o",
            output.to_str().unwrap(),
        ]);
        bundle_image(&args).unwrap();

        let conf = read_entry(&output, "world/bundle.conf").unwrap();
        assert!(conf.contains("name = \"world\""));
        assert!(read_entry(&output, "world/world/oci-layout").is_some());
    }

    #[test]
    fn test_bundle_image_without_layout() {
        let work = TempDir::new().unwrap();
        fs::write(work.path().join("readme"), "nothing here").unwrap();

        let args = parse(&[work.path().to_str().unwrap(), "--name", "world"]);
        let err = bundle_image(&args).unwrap_err();
        assert!(err.to_string().contains("no oci-layout found"));
    }
}
