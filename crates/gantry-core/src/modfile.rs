//! Module definition file (`go.mod`) parsing
//!
//! The release engine only needs the module identity path and the set of
//! required module paths, so parsing is deliberately lax: unknown directives
//! are skipped, block directives are consumed without interpretation.

use std::path::Path;

use tracing::debug;

use crate::error::{ModFileError, Result};

/// File name of the module definition file.
pub const MODULE_FILE_NAME: &str = "go.mod";

/// A parsed module definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFile {
    /// The module identity path from the `module` directive.
    pub module_path: String,
    /// The declared requirements.
    pub requires: Vec<Require>,
}

/// A single requirement declared by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    /// Required module path.
    pub path: String,
    /// Required version string.
    pub version: String,
}

impl ModuleFile {
    /// The paths of all declared requirements.
    pub fn require_paths(&self) -> Vec<String> {
        self.requires.iter().map(|r| r.path.clone()).collect()
    }
}

/// Load the module definition file located in the provided directory.
pub fn load_module_file(dir: &Path) -> Result<ModuleFile> {
    let path = dir.join(MODULE_FILE_NAME);
    if !path.exists() {
        return Err(ModFileError::NotFound(path).into());
    }

    let source = std::fs::read_to_string(&path).map_err(ModFileError::Io)?;
    parse_module_file(&source, &path)
}

/// Returns whether a module definition file is present in the directory.
pub fn is_module_file_present(dir: &Path) -> bool {
    dir.join(MODULE_FILE_NAME).is_file()
}

/// Parse module file source. `origin` is only used for error reporting.
pub fn parse_module_file(source: &str, origin: &Path) -> Result<ModuleFile> {
    let mut module_path: Option<String> = None;
    let mut requires = Vec::new();
    let mut block: Option<String> = None;

    for raw in source.lines() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(kind) = &block {
            if line == ")" {
                block = None;
            } else if kind == "require" {
                requires.push(parse_require(line, origin)?);
            }
            continue;
        }

        let mut parts = line.split_whitespace();
        let directive = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        match directive {
            "module" => match rest.as_slice() {
                [path] => module_path = Some(unquote(path).to_string()),
                _ => {
                    return Err(ModFileError::ParseError {
                        path: origin.to_path_buf(),
                        reason: format!("malformed module directive: {line}"),
                    }
                    .into())
                }
            },
            "require" if rest == ["("] => block = Some("require".to_string()),
            "require" => requires.push(parse_require(&rest.join(" "), origin)?),
            // Other block directives (replace, exclude, retract) are consumed
            // without interpretation.
            _ if rest.last() == Some(&"(") => block = Some(directive.to_string()),
            _ => {}
        }
    }

    let module_path = module_path.ok_or_else(|| ModFileError::MissingModuleDirective(origin.to_path_buf()))?;

    debug!(module = %module_path, requires = requires.len(), "parsed module file");

    Ok(ModuleFile {
        module_path,
        requires,
    })
}

fn parse_require(line: &str, origin: &Path) -> Result<Require> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(path), Some(version)) => Ok(Require {
            path: unquote(path).to_string(),
            version: version.to_string(),
        }),
        _ => Err(ModFileError::ParseError {
            path: origin.to_path_buf(),
            reason: format!("malformed require directive: {line}"),
        }
        .into()),
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(i) => &line[..i],
        None => line,
    }
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}
