//! # Runtime Resolver
//!
//! Turns one function definition into the `exec` block of an action.
//!
//! Runtimes are tried in a fixed priority order and the first one whose
//! predicate matches wins:
//!
//! | Runtime  | Matches when                         | Entry point        |
//! |----------|--------------------------------------|--------------------|
//! | binary   | runtime starts with `binary`         | `exec`             |
//! | docker   | runtime is exactly `docker`          | image = handler    |
//! | nodejs   | runtime starts with `nodejs` (default) | `package.json` main |
//! | python   | runtime starts with `python`         | `__main__.py`      |
//! | swift    | runtime starts with `swift`          | `main.swift`       |
//! | php      | runtime starts with `php`            | `index.php`        |
//! | sequence | `sequence` is set                    | component list     |
//! | java     | runtime starts with `java`           | jar unchanged      |
//! | ruby     | runtime starts with `ruby`           | `main.rb`          |
//!
//! Every runtime but sequence also requires a `handler`.

pub mod archive;

use crate::error::DeployError;
use crate::manifest::{FunctionDef, Manifest, DEFAULT_RUNTIME};
use crate::naming;
use archive::ActionArchive;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;
use whisk_platform::Exec;

const BINARY_IMAGE: &str = "openwhisk/dockerskeleton";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Binary,
    Docker,
    Node,
    Python,
    Swift,
    Php,
    Sequence,
    Java,
    Ruby,
}

impl Runtime {
    pub const PRIORITY: [Runtime; 9] = [
        Runtime::Binary,
        Runtime::Docker,
        Runtime::Node,
        Runtime::Python,
        Runtime::Swift,
        Runtime::Php,
        Runtime::Sequence,
        Runtime::Java,
        Runtime::Ruby,
    ];

    /// Prefix a runtime tag must start with.
    pub fn kind(self) -> &'static str {
        match self {
            Runtime::Binary => "binary",
            Runtime::Docker => "docker",
            Runtime::Node => "nodejs",
            Runtime::Python => "python",
            Runtime::Swift => "swift",
            Runtime::Php => "php",
            Runtime::Sequence => "sequence",
            Runtime::Java => "java",
            Runtime::Ruby => "ruby",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Runtime::Node => ".js",
            Runtime::Python => ".py",
            Runtime::Swift => ".swift",
            Runtime::Php => ".php",
            Runtime::Java => ".jar",
            Runtime::Ruby => ".rb",
            Runtime::Binary | Runtime::Docker | Runtime::Sequence => "",
        }
    }

    /// Archive entry the handler file is moved to, if the runtime renames it.
    fn entry_point(self) -> Option<&'static str> {
        match self {
            Runtime::Binary => Some("exec"),
            Runtime::Python => Some("__main__.py"),
            Runtime::Swift => Some("main.swift"),
            Runtime::Php => Some("index.php"),
            Runtime::Ruby => Some("main.rb"),
            _ => None,
        }
    }

    fn matches(self, tag: Option<&str>, function: &FunctionDef) -> bool {
        match self {
            Runtime::Sequence => function.is_sequence(),
            _ if function.handler.is_none() => false,
            Runtime::Docker => tag == Some("docker"),
            Runtime::Node => tag.unwrap_or(DEFAULT_RUNTIME).starts_with(self.kind()),
            _ => tag.is_some_and(|tag| tag.starts_with(self.kind())),
        }
    }

    /// Source file path for `handler`, relative to the service.
    fn handler_path(self, handler: &str) -> String {
        match self {
            Runtime::Binary => handler.to_string(),
            Runtime::Java => match handler.rfind(':') {
                Some(colon) => handler[..colon].to_string(),
                None => handler.to_string(),
            },
            _ => match handler.rfind('.') {
                Some(dot) => format!("{}{}", &handler[..dot], self.extension()),
                None => handler.to_string(),
            },
        }
    }

    fn main(self, handler: &str) -> String {
        match self {
            Runtime::Java => handler
                .rsplit_once(':')
                .map(|(_, main)| main)
                .filter(|main| !main.is_empty())
                .unwrap_or("Main")
                .to_string(),
            _ => handler
                .rsplit_once('.')
                .map(|(_, main)| main)
                .unwrap_or("main")
                .to_string(),
        }
    }
}

/// Path of the handler inside the archive: leading `../` segments dropped.
fn path_in_archive(path: &str) -> &str {
    let mut path = path;
    while let Some(rest) = path.strip_prefix("../") {
        path = rest;
    }
    path
}

pub struct RuntimeResolver<'a> {
    manifest: &'a Manifest,
}

impl<'a> RuntimeResolver<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        Self { manifest }
    }

    /// Function runtime, else provider runtime.
    pub fn runtime_tag<'f>(&'f self, function: &'f FunctionDef) -> Option<&'f str> {
        function
            .runtime
            .as_deref()
            .or(self.manifest.provider.runtime.as_deref())
    }

    pub fn runtime_for(&self, function: &FunctionDef) -> Option<Runtime> {
        let tag = self.runtime_tag(function);
        Runtime::PRIORITY
            .into_iter()
            .find(|runtime| runtime.matches(tag, function))
    }

    /// Resolves the `exec` block for function `key`.
    pub fn resolve(&self, key: &str, function: &FunctionDef) -> Result<Exec, DeployError> {
        let runtime = self.runtime_for(function).ok_or_else(|| {
            DeployError::packaging(
                "This runtime is not currently supported by the OpenWhisk provider plugin.",
            )
        })?;
        debug!(function = key, runtime = runtime.kind(), "Runtime matched");

        match (runtime, function.handler.as_deref()) {
            (Runtime::Sequence, _) => self.sequence(key, function),
            (Runtime::Docker, Some(image)) => Ok(Exec::image(image)),
            (runtime, Some(handler)) => self.code(runtime, key, handler, function),
            (_, None) => Err(DeployError::validation(format!(
                "Missing \"handler\" or \"sequence\" property in function {}",
                key
            ))),
        }
    }

    fn code(
        &self,
        runtime: Runtime,
        key: &str,
        handler: &str,
        function: &FunctionDef,
    ) -> Result<Exec, DeployError> {
        let handler_path = runtime.handler_path(handler);
        let zip_path = path_in_archive(&handler_path);

        let mut archive = ActionArchive::read(&self.artifact_path(key, function)?)?;
        if !has_handler(runtime, &archive, zip_path) {
            return Err(DeployError::packaging(format!(
                "Function handler ({}) does not exist.",
                handler_path
            )));
        }

        match runtime {
            Runtime::Node => {
                archive.insert("package.json", json!({ "main": zip_path }).to_string().into_bytes())
            }
            Runtime::Java => {}
            _ => {
                if let Some(entry_point) = runtime.entry_point() {
                    archive.rename(zip_path, entry_point)?;
                }
            }
        }
        let code = archive.encode()?;

        if runtime == Runtime::Binary {
            return Ok(Exec::Code {
                kind: Exec::BLACKBOX_KIND.to_string(),
                code,
                main: None,
                image: Some(BINARY_IMAGE.to_string()),
            });
        }

        Ok(Exec::Code {
            kind: self.kind(runtime, function),
            code,
            main: Some(runtime.main(handler)),
            image: function.image.clone(),
        })
    }

    /// `blackbox` when a custom image is set; otherwise the runtime tag with
    /// `:default` appended when it has no version (python keeps it as given).
    fn kind(&self, runtime: Runtime, function: &FunctionDef) -> String {
        if function.image.is_some() {
            return Exec::BLACKBOX_KIND.to_string();
        }
        let tag = self.runtime_tag(function).unwrap_or(DEFAULT_RUNTIME);
        if runtime == Runtime::Python || tag.contains(':') {
            tag.to_string()
        } else {
            format!("{}:default", tag)
        }
    }

    fn artifact_path(&self, key: &str, function: &FunctionDef) -> Result<PathBuf, DeployError> {
        let artifact = if self.manifest.package.individually {
            function.package.as_ref().and_then(|p| p.artifact.as_ref())
        } else {
            self.manifest.package.artifact.as_ref()
        };
        artifact
            .map(|path| self.manifest.resolve_path(path))
            .ok_or_else(|| {
                DeployError::packaging(format!("No artifact configured for function {}", key))
            })
    }

    /// Fully qualified component names. Bare names refer to functions of
    /// this service.
    fn sequence(&self, key: &str, function: &FunctionDef) -> Result<Exec, DeployError> {
        let components = function
            .sequence
            .iter()
            .flatten()
            .map(|component| {
                if component.starts_with('/') {
                    return Ok(component.clone());
                }
                let target = self.manifest.function(component).ok_or_else(|| {
                    DeployError::validation(format!(
                        "Sequence component ({}) in function {} is not a function of this service",
                        component, key
                    ))
                })?;
                let namespace = naming::function_namespace(self.manifest, target);
                let name = naming::function_name(&self.manifest.service, component, target);
                Ok(naming::qualified(namespace.as_deref(), &name))
            })
            .collect::<Result<Vec<_>, DeployError>>()?;
        Ok(Exec::sequence(components))
    }
}

/// Node also accepts a TypeScript source in place of the `.js` file.
fn has_handler(runtime: Runtime, archive: &ActionArchive, path: &str) -> bool {
    if archive.contains(path) {
        return true;
    }
    runtime == Runtime::Node
        && path.to_ascii_lowercase().ends_with(".js")
        && archive.contains(&format!("{}.ts", &path[..path.len() - 3]))
}
