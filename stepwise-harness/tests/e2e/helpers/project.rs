//! Temporary project builder for E2E tests.

use std::fs;
use std::path::Path;

use stepwise_harness::Project;
use tempfile::TempDir;

/// A project rooted in a temporary directory. The directory is removed on drop.
pub struct TestProject {
    pub dir: TempDir,
    pub project: Project,
}

impl TestProject {
    /// An empty project: no settings files at all.
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = Project::new(dir.path());
        Self { dir, project }
    }

    /// A project created by `Project::scaffold`.
    #[allow(dead_code)]
    pub fn scaffolded() -> Self {
        let test = Self::empty();
        test.project.scaffold().expect("scaffold");
        test
    }

    /// Write a file relative to the `settings/` directory.
    #[allow(dead_code)]
    pub fn with_setting(self, name: &str, content: &str) -> Self {
        let path = self.project.layout().config_dir().join(name);
        write(&path, content);
        self
    }

    /// Enable visual testing in the framework file.
    #[allow(dead_code)]
    pub fn with_visual_tests(self, fail: bool) -> Self {
        let content = format!(
            "[Driver]\ntype = chrome\n\n[VisualTests]\nenabled = true\nfail = {fail}\n"
        );
        self.with_setting("toolium.conf", &content)
    }

    #[allow(dead_code)]
    pub fn output_dir(&self) -> &Path {
        self.project.layout().output_dir()
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, content).expect("write file");
}
