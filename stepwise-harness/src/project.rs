//! Project directory conventions.
//!
//! A stepwise project keeps its configuration under `settings/` and writes
//! logs and screenshots to `_output/`:
//!
//! ```text
//! <root>/
//!   settings/
//!     toolium.conf
//!     logging.conf
//!     qa-properties.json
//!     language/es_common.cfg
//!   _output/
//!     acceptance_int.log
//!     visualtests/
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use stepwise_core::config::{ConfigLayout, ConfigResolver, RuntimeParams};

/// Settings directory name, relative to the project root.
pub const SETTINGS_DIR: &str = "settings";

/// Output directory name, relative to the project root.
pub const OUTPUT_DIR: &str = "_output";

const FRAMEWORK_TEMPLATE: &str = "\
# Framework configuration. Environment files override these values.
[Driver]
type = firefox
implicitly_wait = 5

[VisualTests]
enabled = false
fail = true
threshold = 0.0
baseline_name = default
";

const LOGGING_TEMPLATE: &str = "\
# RUST_LOG takes precedence over the level below.
[logging]
level = info
format = pretty
file = true
console = true
";

const ENVIRONMENT_TEMPLATE: &str = "{\n  \"Driver\": {\n    \"type\": \"firefox\"\n  }\n}\n";

const LANGUAGE_TEMPLATE: &str = "\
# Texts for the 'common' item in Spanish.
accept = Aceptar
cancel = Cancelar
";

/// A stepwise project rooted at a directory.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    layout: ConfigLayout,
}

/// One file or directory touched by [`Project::scaffold`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaffoldEntry {
    pub path: PathBuf,
    /// `false` when the path already existed and was left untouched.
    pub created: bool,
}

impl Project {
    /// Use the standard `settings/` and `_output/` layout under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let layout = ConfigLayout::new(root.join(SETTINGS_DIR), root.join(OUTPUT_DIR));
        Self { root, layout }
    }

    /// Use a custom layout (e.g. a different framework file name).
    pub fn with_layout(root: impl Into<PathBuf>, layout: ConfigLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &ConfigLayout {
        &self.layout
    }

    pub fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new(self.layout.clone())
    }

    /// Create the directory structure and template files.
    ///
    /// Existing files are never overwritten; they are reported with `created: false`.
    pub fn scaffold(&self) -> io::Result<Vec<ScaffoldEntry>> {
        let mut entries = Vec::new();

        for dir in [
            self.layout.config_dir(),
            self.layout.language_dir(),
            self.layout.output_dir(),
        ] {
            let created = !dir.is_dir();
            fs::create_dir_all(dir)?;
            entries.push(ScaffoldEntry {
                path: dir.to_path_buf(),
                created,
            });
        }

        let default_env = RuntimeParams::default();
        let files = [
            (self.layout.framework_path(), FRAMEWORK_TEMPLATE),
            (self.layout.logging_path(), LOGGING_TEMPLATE),
            (
                self.layout.environment_path(default_env.environment()),
                ENVIRONMENT_TEMPLATE,
            ),
            (
                self.layout
                    .language_dir()
                    .join(format!("{}_common.cfg", default_env.language())),
                LANGUAGE_TEMPLATE,
            ),
        ];
        for (path, content) in files {
            let created = write_new(&path, content)?;
            entries.push(ScaffoldEntry { path, created });
        }

        Ok(entries)
    }
}

/// Write `content` to a new file. Returns `false` if the file already exists.
fn write_new(path: &Path, content: &str) -> io::Result<bool> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(content.as_bytes())?;
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}
