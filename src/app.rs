//! Stage orchestration.
//!
//! Each public method runs one stage of the workflow against the project.

use crate::config::ProjectConfig;
use crate::domain::{OpenApiDir, Project, SpecArtifact, Stage, SyncReport};
use crate::error::Result;
use crate::services::postman::{self, DESCRIPTION_FILE};
use crate::services::postman_api::COLLECTION_FILE_ENV;
use crate::services::{
    convert, DependencyInstaller, GitService, LibrarySynchronizer, PostmanClient, ProcessService,
    Publisher, SampleEnricher, SpecBuilder, UploadTarget,
};
use std::path::PathBuf;

/// Runs workflow stages for one repository
pub struct App {
    /// Project context
    pub project: Project,
    process: ProcessService,
}

impl App {
    /// Load configuration for `project_root` and prepare the services
    pub fn new(project_root: PathBuf) -> Result<Self> {
        let config = ProjectConfig::load(Some(&project_root))?;
        let project = Project::new(project_root, config);
        let process = ProcessService::new(project.logs_directory.clone());
        Ok(Self::with_process(project, process))
    }

    pub fn with_process(project: Project, process: ProcessService) -> Self {
        Self { project, process }
    }

    fn python(&self) -> &str {
        &self.project.config.python.interpreter
    }

    fn announce(stage: Stage) {
        println!("==> {}", stage);
    }

    /// Install the spec builder's Python dependencies
    pub fn setup(&self, openapi_dir: &OpenApiDir) -> Result<()> {
        Self::announce(Stage::Setup);
        DependencyInstaller::new(self.process.clone(), self.python()).install(openapi_dir)?;
        println!("Dependencies installed");
        Ok(())
    }

    /// Run the spec builder and copy its output into `defs/`
    pub fn build_spec(&self, openapi_dir: &OpenApiDir, with_sdk: bool) -> Result<Vec<PathBuf>> {
        Self::announce(Stage::BuildSpec);
        let include_sdk = with_sdk || self.project.config.build.include_sdk_spec;
        let artifacts = SpecArtifact::for_build(include_sdk);

        let written = SpecBuilder::new(self.process.clone(), self.python()).build(
            openapi_dir,
            &self.project.defs_directory,
            &artifacts,
        )?;

        for path in &written {
            println!("  {}", path.display());
        }
        Ok(written)
    }

    /// Clone or update every client library working copy
    pub fn sync_libraries(&self) -> Result<SyncReport> {
        Self::announce(Stage::SyncLibraries);
        let libraries = self
            .project
            .config
            .client_libraries(&self.project.build_directory)?;

        let synchronizer = LibrarySynchronizer::new(GitService::new(self.process.clone()));
        let report = synchronizer.sync_all(&libraries)?;

        for (name, outcome) in &report.entries {
            println!("  {:<16} {}", name, outcome.label());
        }
        Ok(report)
    }

    /// Inject client library code samples into the REST spec
    pub fn add_samples(&self) -> Result<usize> {
        Self::announce(Stage::AddSamples);
        let enricher = SampleEnricher::new(self.project.build_directory.clone());
        let updated = enricher.enrich(&self.project.rest_spec_path())?;
        println!("  {} operations updated", updated);
        Ok(updated)
    }

    /// Build the specs, synchronize libraries, then add samples.
    ///
    /// Stops at the first failing stage.
    pub fn build(&self, openapi_dir: &OpenApiDir, with_sdk: bool) -> Result<()> {
        self.build_spec(openapi_dir, with_sdk)?;
        self.sync_libraries()?;
        self.add_samples()?;
        Ok(())
    }

    /// Write JSON siblings of the specs
    pub fn convert_json(&self) -> Result<Vec<PathBuf>> {
        Self::announce(Stage::ConvertJson);
        let written = convert::convert_specs_to_json(&self.project.defs_directory)?;
        for path in &written {
            println!("  {}", path.display());
        }
        Ok(written)
    }

    /// Collection file name: `POSTMAN_COLLECTION_FILE`, else the configured default
    fn collection_file(&self) -> String {
        std::env::var(COLLECTION_FILE_ENV)
            .ok()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| self.project.config.postman.default_collection_file.clone())
    }

    /// Convert the REST spec into a Postman collection
    pub fn postman_convert(&self) -> Result<PathBuf> {
        Self::announce(Stage::PostmanConvert);
        let defs = &self.project.defs_directory;
        let output = postman::convert_file(
            &self.project.rest_spec_path(),
            &defs.join(DESCRIPTION_FILE),
            &defs.join(self.collection_file()),
        )?;
        println!("  {}", output.display());
        Ok(output)
    }

    /// Replace the remote Postman collection with the local file
    pub async fn postman_upload(&self) -> Result<()> {
        Self::announce(Stage::PostmanUpload);
        let target = UploadTarget::from_env(&self.project.defs_directory)?;
        PostmanClient::new(&self.project.config.postman.api_base_url)
            .update_collection(&target)
            .await?;
        println!("  Collection {} updated", target.collection_id);
        Ok(())
    }

    /// Upload the REST spec to the documentation host
    pub fn publish(&self) -> Result<()> {
        Self::announce(Stage::Publish);
        Publisher::new(self.process.clone(), self.project.config.publish.clone())
            .publish(&self.project.rest_spec_path())?;
        println!("  Published {}", SpecArtifact::Rest);
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::LibraryConfig;
    use crate::error::{AppError, SyncError};
    use crate::services::git::test_support::create_test_repo;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const FAKE_BUILD: &str = r#"mkdir -p dist
cat > dist/public_asana_oas.yaml <<'EOF'
openapi: 3.0.0
info:
  title: Asana
paths:
  /tasks:
    get:
      operationId: getTasks
EOF
echo "openapi: 3.0.0" > dist/public_app_components_oas.yaml"#;

    fn library(name: &str, upstream: &Path) -> LibraryConfig {
        LibraryConfig {
            name: name.to_string(),
            url: upstream.to_string_lossy().into_owned(),
            path: None,
            branch: Some("master".to_string()),
            tag: None,
        }
    }

    fn fixture(temp: &TempDir, libraries: Vec<LibraryConfig>) -> (App, OpenApiDir) {
        let tool = temp.path().join("openapi");
        fs::create_dir_all(&tool).unwrap();
        fs::write(tool.join("build.py"), FAKE_BUILD).unwrap();

        let mut config = ProjectConfig::default();
        config.python.interpreter = "sh".to_string();
        config.libraries = libraries;

        let project = Project::new(temp.path().join("repo"), config);
        let app = App::with_process(project, ProcessService::without_logs().quiet());
        (app, OpenApiDir::resolve(Some(tool)).unwrap())
    }

    #[test]
    fn test_build_runs_every_stage() {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        create_test_repo(&upstream);

        let (app, dir) = fixture(&temp, vec![library("python", &upstream)]);
        app.build(&dir, false).unwrap();

        let defs = &app.project.defs_directory;
        assert!(fs::metadata(defs.join("asana_oas.yaml")).unwrap().len() > 0);
        assert!(fs::metadata(defs.join("app_components_oas.yaml")).unwrap().len() > 0);
        assert!(app.project.build_directory.join("python/README.md").exists());
    }

    #[test]
    fn test_sync_failure_skips_samples() {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        create_test_repo(&upstream);

        let (app, dir) = fixture(
            &temp,
            vec![
                library("java", &upstream),
                library("node", &upstream),
                library("python", &temp.path().join("missing")),
            ],
        );

        // A ruby sample that would land in the spec if the enricher ran
        let samples = app.project.build_directory.join("ruby/samples");
        fs::create_dir_all(&samples).unwrap();
        fs::write(samples.join("tasks.yaml"), "tasks:\n  get_tasks: code\n").unwrap();

        let err = app.build(&dir, false).unwrap_err();
        assert!(matches!(err, AppError::Sync(SyncError::Library { ref library, .. }) if library == "python"));

        let build = &app.project.build_directory;
        assert!(build.join("java/README.md").exists());
        assert!(build.join("node/README.md").exists());

        let spec = fs::read_to_string(app.project.rest_spec_path()).unwrap();
        assert!(!spec.contains("x-readme"));
    }

    #[test]
    fn test_convert_json_and_postman() {
        let temp = TempDir::new().unwrap();
        let (app, _) = fixture(&temp, Vec::new());
        let defs = &app.project.defs_directory;
        fs::create_dir_all(defs).unwrap();
        fs::write(
            defs.join("asana_oas.yaml"),
            "openapi: 3.0.0\ninfo:\n  title: Asana\n  description: API\nservers:\n  - url: https://app.asana.com/api/1.0\ntags: []\npaths: {}\n",
        )
        .unwrap();

        let written = app.convert_json().unwrap();
        assert_eq!(written, vec![defs.join("asana_oas.json")]);

        let collection = app.postman_convert().unwrap();
        assert!(collection.starts_with(defs));
        assert!(collection.exists());
    }
}
