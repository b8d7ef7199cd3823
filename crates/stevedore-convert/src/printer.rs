//! Writing generated objects
//!
//! Output layout depends on the options:
//! - `--stdout`: one `List` document on standard output
//! - `--chart`: a chart directory with one template per object
//! - `--out <dir>` (existing directory): one file per object in it
//! - `--out <file>`: one `List` document in that file
//! - nothing: one file per object in the working directory

use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use stevedore_core::{ConvertOptions, OutputFormat, Provider, Result};
use tracing::info;

use crate::transformer::ResourceObject;

/// Chart name used when none can be derived from the inputs
const DEFAULT_CHART_NAME: &str = "chart";

/// `v1 List` wrapper used for single-artifact output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct List<'a> {
    api_version: &'static str,
    kind: &'static str,
    items: &'a [ResourceObject],
}

impl<'a> List<'a> {
    fn new(items: &'a [ResourceObject]) -> Self {
        Self {
            api_version: "v1",
            kind: "List",
            items,
        }
    }
}

/// Serialize a value in the requested format
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(value)?;
            json.push('\n');
            json
        }
    })
}

/// File name of a single object: `<name>-<kind>.<ext>`
pub fn object_file_name(object: &ResourceObject, format: OutputFormat) -> String {
    format!(
        "{}-{}.{}",
        object.name(),
        object.kind().to_ascii_lowercase(),
        format.extension()
    )
}

/// Write `objects` where the options say
pub fn print_list(objects: &[ResourceObject], opt: &ConvertOptions) -> Result<()> {
    let format = opt.output_format();
    let out_file = opt.out_file.as_deref().filter(|_| opt.has_out_file());

    if opt.to_stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(render(&List::new(objects), format)?.as_bytes())?;
        handle.flush()?;
        return Ok(());
    }

    if opt.create_chart {
        let chart_dir = match out_file {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from(chart_name(opt)),
        };
        write_chart(&chart_dir, objects, opt)?;
        return Ok(());
    }

    match out_file {
        Some(dir) if dir.is_dir() => {
            write_each(dir, objects, format, opt.provider)?;
        }
        Some(file) => {
            fs::write(file, render(&List::new(objects), format)?)?;
            info!("{} file \"{}\" created", opt.provider.display_name(), file.display());
        }
        None => {
            write_each(Path::new("."), objects, format, opt.provider)?;
        }
    }

    Ok(())
}

/// Write one file per object into `dir`, returning the written paths
pub fn write_each(
    dir: &Path,
    objects: &[ResourceObject],
    format: OutputFormat,
    provider: Provider,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(objects.len());
    for object in objects {
        let path = dir.join(object_file_name(object, format));
        fs::write(&path, render(object, format)?)?;
        info!("{} file \"{}\" created", provider.display_name(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// Chart name: the directory holding the first input file
fn chart_name(opt: &ConvertOptions) -> String {
    opt.input_files
        .first()
        .and_then(|file| file.canonicalize().ok())
        .and_then(|file| {
            file.parent()
                .and_then(|dir| dir.file_name())
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| DEFAULT_CHART_NAME.to_string())
}

/// Write a chart directory: `Chart.yaml`, `README.md` and `templates/`
pub fn write_chart(dir: &Path, objects: &[ResourceObject], opt: &ConvertOptions) -> Result<()> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_CHART_NAME.to_string());
    let templates = dir.join("templates");
    fs::create_dir_all(&templates)?;

    let chart_yaml = format!(
        "apiVersion: v2\nname: {}\ndescription: A generated chart for {}\nversion: 0.0.1\n",
        name,
        opt.provider.display_name()
    );
    fs::write(dir.join("Chart.yaml"), chart_yaml)?;

    let readme = format!(
        "# {}\n\nGenerated from {}.\n",
        name,
        opt.input_files
            .iter()
            .map(|f| f.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    fs::write(dir.join("README.md"), readme)?;

    write_each(&templates, objects, opt.output_format(), opt.provider)?;
    info!("chart \"{}\" created", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::{Kubernetes, Transformer};
    use stevedore_core::{ComposeObject, PortMapping, Protocol, ServiceConfig};
    use tempfile::TempDir;

    fn objects(opt: &ConvertOptions) -> Vec<ResourceObject> {
        let mut object = ComposeObject::new();
        let mut web = ServiceConfig::new("web");
        web.image = Some("nginx".to_string());
        web.ports.push(PortMapping {
            host_port: Some(80),
            container_port: 80,
            protocol: Protocol::Tcp,
        });
        object.insert(web);
        Kubernetes::new().transform(&object, opt).unwrap()
    }

    fn deployment_opts() -> ConvertOptions {
        ConvertOptions {
            create_deployment: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_write_each_into_directory() {
        let dir = TempDir::new().unwrap();
        let opt = ConvertOptions {
            out_file: Some(dir.path().to_path_buf()),
            ..deployment_opts()
        };

        print_list(&objects(&opt), &opt).unwrap();

        let deployment = fs::read_to_string(dir.path().join("web-deployment.yaml")).unwrap();
        assert!(deployment.contains("kind: Deployment"));
        assert!(dir.path().join("web-service.yaml").exists());
    }

    #[test]
    fn test_single_file_list() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("all.yaml");
        let opt = ConvertOptions {
            out_file: Some(file.clone()),
            ..deployment_opts()
        };

        print_list(&objects(&opt), &opt).unwrap();

        let value: serde_yaml::Value =
            serde_yaml::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(value["kind"], "List");
        assert_eq!(value["items"][0]["kind"], "Deployment");
        assert_eq!(value["items"][1]["kind"], "Service");
    }

    #[test]
    fn test_json_output() {
        let dir = TempDir::new().unwrap();
        let opt = ConvertOptions {
            out_file: Some(dir.path().to_path_buf()),
            generate_json: true,
            ..deployment_opts()
        };

        print_list(&objects(&opt), &opt).unwrap();

        let content = fs::read_to_string(dir.path().join("web-deployment.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["apiVersion"], "apps/v1");
    }

    #[test]
    fn test_chart_layout() {
        let dir = TempDir::new().unwrap();
        let chart = dir.path().join("webapp");
        let opt = ConvertOptions {
            out_file: Some(chart.clone()),
            create_chart: true,
            input_files: vec![PathBuf::from("docker-compose.yml")],
            ..deployment_opts()
        };

        print_list(&objects(&opt), &opt).unwrap();

        let chart_yaml = fs::read_to_string(chart.join("Chart.yaml")).unwrap();
        assert!(chart_yaml.contains("name: webapp"));
        assert!(chart.join("README.md").exists());
        assert!(chart.join("templates/web-deployment.yaml").exists());
        assert!(chart.join("templates/web-service.yaml").exists());
    }

    #[test]
    fn test_object_file_name() {
        let opt = deployment_opts();
        let objects = objects(&opt);
        assert_eq!(
            object_file_name(&objects[0], OutputFormat::Yaml),
            "web-deployment.yaml"
        );
        assert_eq!(
            object_file_name(&objects[1], OutputFormat::Json),
            "web-service.json"
        );
    }
}
