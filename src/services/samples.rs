//! Injects client library code samples into the REST API spec.
//!
//! Samples come from two places under the build directory:
//! - `<language>/samples/**`: YAML maps `resource → operation → code`
//! - `<language>-preview/docs/*Api.yaml`: the same layout, produced by the
//!   generated preview libraries
//!
//! Each matching operation of the spec gets an `x-readme.code-samples` list.

use crate::domain::{camel_case, preview_resource_name, CodeSample, Language};
use crate::error::{SampleError, SampleResult};
use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// HTTP methods that receive samples
const SAMPLE_METHODS: [&str; 4] = ["delete", "get", "post", "put"];

/// Samples grouped by resource, then by camelCase operation id, in discovery order
pub type SampleIndex = IndexMap<String, IndexMap<String, Vec<CodeSample>>>;

fn preview_doc_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^.*Api\.yaml$").expect("valid preview doc pattern"))
}

/// Gathers samples from synchronized working copies and writes them into a spec
#[derive(Debug, Clone)]
pub struct SampleEnricher {
    build_dir: PathBuf,
}

impl SampleEnricher {
    pub fn new(build_dir: PathBuf) -> Self {
        Self { build_dir }
    }

    /// Collect samples for every language
    pub fn gather(&self) -> SampleResult<SampleIndex> {
        let mut index = SampleIndex::new();

        for language in Language::ALL {
            let samples_dir = self.build_dir.join(language.as_str()).join("samples");
            for (path, data) in read_yaml_files(&samples_dir, |_| true)? {
                for (resource, operation, code) in entries(&path, data)? {
                    add_sample(
                        &mut index,
                        language.resource_name(&resource),
                        &operation,
                        CodeSample::current(language, code),
                    );
                }
            }

            if language.has_preview() {
                let docs_dir = self
                    .build_dir
                    .join(format!("{}-preview", language))
                    .join("docs");
                let is_api_doc = |name: &str| preview_doc_pattern().is_match(name);
                for (path, data) in read_yaml_files(&docs_dir, is_api_doc)? {
                    for (resource, operation, code) in entries(&path, data)? {
                        add_sample(
                            &mut index,
                            preview_resource_name(&resource),
                            &operation,
                            CodeSample::preview(language, code),
                        );
                    }
                }
            }
        }

        Ok(index)
    }

    /// Gather samples and rewrite `spec_path` in place.
    ///
    /// Returns the number of operations that received samples.
    pub fn enrich(&self, spec_path: &Path) -> SampleResult<usize> {
        if !spec_path.is_file() {
            return Err(SampleError::SpecNotFound(spec_path.to_path_buf()));
        }

        tracing::info!("Gathering sample code from {}", self.build_dir.display());
        let index = self.gather()?;

        let content = fs::read_to_string(spec_path)?;
        let mut spec: Value = serde_yaml::from_str(&content).map_err(|source| SampleError::Parse {
            path: spec_path.to_path_buf(),
            source,
        })?;

        let updated = inject(&mut spec, &index, spec_path)?;
        fs::write(spec_path, serde_yaml::to_string(&spec)?)?;

        tracing::info!("Added code samples to {} operations", updated);
        Ok(updated)
    }
}

fn add_sample(index: &mut SampleIndex, resource: String, operation: &str, sample: CodeSample) {
    index
        .entry(resource)
        .or_default()
        .entry(camel_case(operation))
        .or_default()
        .push(sample);
}

/// Parse every file under `dir` whose name passes `filter`, in file name order.
///
/// A missing directory yields nothing.
fn read_yaml_files(
    dir: &Path,
    filter: impl Fn(&str) -> bool,
) -> SampleResult<Vec<(PathBuf, Value)>> {
    if !dir.is_dir() {
        tracing::debug!("No samples at {}", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !filter(&name) {
            continue;
        }

        let path = entry.path().to_path_buf();
        let content = fs::read_to_string(&path)?;
        let data = serde_yaml::from_str(&content).map_err(|source| SampleError::Parse {
            path: path.clone(),
            source,
        })?;
        files.push((path, data));
    }

    Ok(files)
}

/// Flatten a `resource → operation → code` document
fn entries(path: &Path, data: Value) -> SampleResult<Vec<(String, String, String)>> {
    let layout = |reason: String| SampleError::Layout {
        path: path.to_path_buf(),
        reason,
    };

    let resources = match data {
        Value::Mapping(m) => m,
        Value::Null => return Ok(Vec::new()),
        _ => return Err(layout("top level is not a mapping".to_string())),
    };

    let mut out = Vec::new();
    for (resource, operations) in resources {
        let resource = key_string(&resource)
            .ok_or_else(|| layout("resource key is not a string".to_string()))?;
        let Value::Mapping(operations) = operations else {
            return Err(layout(format!("resource {} is not a mapping", resource)));
        };

        for (operation, code) in operations {
            let operation = key_string(&operation)
                .ok_or_else(|| layout(format!("operation key in {} is not a string", resource)))?;
            let Value::String(code) = code else {
                return Err(layout(format!("sample for {}.{} is not a string", resource, operation)));
            };
            out.push((resource.clone(), operation, code));
        }
    }

    Ok(out)
}

fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Write samples into every matching operation of `spec`
pub fn inject(spec: &mut Value, index: &SampleIndex, spec_path: &Path) -> SampleResult<usize> {
    // The resource discovered last wins when two share an operation id
    let mut by_operation: BTreeMap<&str, &Vec<CodeSample>> = BTreeMap::new();
    for operations in index.values() {
        for (operation, samples) in operations {
            by_operation.insert(operation.as_str(), samples);
        }
    }

    let Some(Value::Mapping(paths)) = spec.get_mut("paths") else {
        return Err(SampleError::Layout {
            path: spec_path.to_path_buf(),
            reason: "spec has no paths mapping".to_string(),
        });
    };

    let mut updated = 0;
    for (_, item) in paths.iter_mut() {
        let Value::Mapping(item) = item else {
            continue;
        };

        for (method, operation) in item.iter_mut() {
            let is_sample_method = method
                .as_str()
                .map(|m| SAMPLE_METHODS.contains(&m))
                .unwrap_or(false);
            if !is_sample_method {
                continue;
            }
            let Value::Mapping(operation) = operation else {
                continue;
            };
            let Some(samples) = operation
                .get("operationId")
                .and_then(Value::as_str)
                .and_then(|id| by_operation.get(id))
            else {
                continue;
            };

            let samples = serde_yaml::to_value(samples)?;
            set_code_samples(operation, samples);
            updated += 1;
        }
    }

    Ok(updated)
}

fn set_code_samples(operation: &mut Mapping, samples: Value) {
    let readme = operation
        .entry(Value::from("x-readme"))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !readme.is_mapping() {
        *readme = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(readme) = readme {
        readme.insert(Value::from("code-samples"), samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SPEC: &str = r#"openapi: 3.0.0
info:
  title: Asana
paths:
  /tasks/{task_gid}:
    parameters:
      - name: task_gid
        in: path
    get:
      operationId: getTask
      summary: Get a task
    put:
      operationId: updateTask
      x-readme:
        explorer-enabled: false
    patch:
      operationId: getTask
  /projects:
    get:
      operationId: getProjects
"#;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn build_fixture(build: &Path) {
        write(
            &build.join("java/samples/tasksbase_sample.yaml"),
            "tasksbase:\n  get_task: \"client.tasks.getTask(taskGid)\"\n",
        );
        write(
            &build.join("python/samples/tasks_sample.yaml"),
            "tasks:\n  get_task: \"client.tasks.get_task(task_gid)\"\n  update_task: \"client.tasks.update_task(task_gid)\"\n",
        );
        write(
            &build.join("node-preview/docs/TasksApi.yaml"),
            "TasksApi:\n  getTask: \"tasksApiInstance.getTask(task_gid)\"\n",
        );
        write(
            &build.join("node-preview/docs/README.md"),
            "not yaml: [",
        );
    }

    #[test]
    fn test_gather_groups_by_resource_and_operation() {
        let temp = TempDir::new().unwrap();
        build_fixture(temp.path());

        let index = SampleEnricher::new(temp.path().to_path_buf()).gather().unwrap();

        let tasks = &index["tasks"];
        let get_task = &tasks["getTask"];
        let languages: Vec<_> = get_task.iter().map(|s| s.language).collect();
        assert_eq!(languages, vec![Language::Java, Language::Node, Language::Python]);
        assert_eq!(get_task[1].name.as_deref(), Some("node-preview"));
        assert_eq!(tasks["updateTask"].len(), 1);
    }

    #[test]
    fn test_missing_directories_yield_no_samples() {
        let temp = TempDir::new().unwrap();
        let index = SampleEnricher::new(temp.path().to_path_buf()).gather().unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_enrich_rewrites_spec() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build");
        build_fixture(&build);
        let spec_path = temp.path().join("defs/asana_oas.yaml");
        write(&spec_path, SPEC);

        let updated = SampleEnricher::new(build).enrich(&spec_path).unwrap();
        assert_eq!(updated, 2);

        let spec: Value = serde_yaml::from_str(&fs::read_to_string(&spec_path).unwrap()).unwrap();
        let get = &spec["paths"]["/tasks/{task_gid}"]["get"];
        let samples = get["x-readme"]["code-samples"].as_sequence().unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0]["language"].as_str(), Some("java"));
        assert_eq!(samples[2]["install"].as_str(), Some("pip install asana"));
        assert!(samples[0].get("name").is_none());

        // Existing x-readme keys survive
        let put = &spec["paths"]["/tasks/{task_gid}"]["put"];
        assert_eq!(put["x-readme"]["explorer-enabled"].as_bool(), Some(false));
        assert_eq!(put["x-readme"]["code-samples"].as_sequence().unwrap().len(), 1);

        // Methods outside delete/get/post/put are left alone
        let patch = &spec["paths"]["/tasks/{task_gid}"]["patch"];
        assert!(patch.get("x-readme").is_none());

        // Operations without samples are untouched
        assert!(spec["paths"]["/projects"]["get"].get("x-readme").is_none());
    }

    #[test]
    fn test_last_discovered_resource_wins_shared_operation() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build");
        // java "usertasklistsbase" and python "user_task_lists" both name getUserTaskList
        write(
            &build.join("java/samples/usertasklistsbase_sample.yaml"),
            "usertasklistsbase:\n  get_user_task_list: \"client.userTaskLists.getUserTaskList(gid)\"\n",
        );
        write(
            &build.join("python/samples/user_task_lists_sample.yaml"),
            "user_task_lists:\n  get_user_task_list: \"client.user_task_lists.get_user_task_list(gid)\"\n",
        );
        let spec_path = temp.path().join("defs/asana_oas.yaml");
        write(
            &spec_path,
            "openapi: 3.0.0\npaths:\n  /user_task_lists/{gid}:\n    get:\n      operationId: getUserTaskList\n",
        );

        SampleEnricher::new(build).enrich(&spec_path).unwrap();

        let spec: Value = serde_yaml::from_str(&fs::read_to_string(&spec_path).unwrap()).unwrap();
        let samples = spec["paths"]["/user_task_lists/{gid}"]["get"]["x-readme"]["code-samples"]
            .as_sequence()
            .unwrap();
        let languages: Vec<_> = samples.iter().filter_map(|s| s["language"].as_str()).collect();
        assert_eq!(languages, vec!["python"]);
    }

    #[test]
    fn test_gather_keeps_discovery_order() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("ruby/samples/a.yaml"),
            "workspaces:\n  get_workspace: code\nattachments:\n  get_attachment: code\n",
        );

        let index = SampleEnricher::new(temp.path().to_path_buf()).gather().unwrap();
        let resources: Vec<_> = index.keys().cloned().collect();
        assert_eq!(resources, vec!["workspaces", "attachments"]);
    }

    #[test]
    fn test_enrich_missing_spec() {
        let temp = TempDir::new().unwrap();
        let err = SampleEnricher::new(temp.path().to_path_buf())
            .enrich(&temp.path().join("defs/asana_oas.yaml"))
            .unwrap_err();
        assert!(matches!(err, SampleError::SpecNotFound(_)));
    }

    #[test]
    fn test_malformed_sample_file() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("ruby/samples/bad.yaml"), "- just\n- a list\n");

        let err = SampleEnricher::new(temp.path().to_path_buf())
            .gather()
            .unwrap_err();
        assert!(matches!(err, SampleError::Layout { .. }));
    }
}
