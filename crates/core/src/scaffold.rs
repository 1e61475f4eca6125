//! Ape project scaffolding for the active contract

use crate::{error::ScaffoldError, language::Language};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Directory name used when the configuration does not override it
pub const DEFAULT_PROJECT_NAME: &str = "sneko-ape-project";

pub const APE_CONFIG_FILE_NAME: &str = "ape-config.yaml";

const GITIGNORE: &str = "# Ape stuff
.build/
.cache/

# Python
.env
.venv
.pytest_cache
.python-version
__pycache__
";

/// Creates `<parent>/<project_name>` holding the contract and an Ape layout
///
/// Fails without touching anything when the directory already exists. A
/// failure halfway through leaves the partial project in place.
pub fn build_ape_project(
    parent: &Path,
    project_name: &str,
    file_name: &str,
    code: &str,
) -> Result<PathBuf, ScaffoldError> {
    let language = Language::from_path(Path::new(file_name)).ok();
    let root = parent.join(project_name);

    fs::create_dir(&root).map_err(|source| {
        if source.kind() == std::io::ErrorKind::AlreadyExists {
            ScaffoldError::AlreadyExists(root.clone())
        } else {
            ScaffoldError::Io {
                path: root.clone(),
                source,
            }
        }
    })?;

    for dir in ["contracts", "tests", "scripts"] {
        let path = root.join(dir);
        fs::create_dir(&path).map_err(|source| ScaffoldError::Io { path, source })?;
    }

    write_file(&root, &format!("contracts/{file_name}"), code)?;
    write_file(&root, ".gitignore", GITIGNORE)?;
    write_file(&root, "README.md", &readme(project_name, file_name))?;
    write_file(&root, APE_CONFIG_FILE_NAME, &ape_config(project_name, language))?;
    write_file(&root, "tests/conftest.py", CONFTEST)?;
    write_file(&root, "tests/test_smoke.py", &smoke_test(file_name))?;
    write_file(&root, "scripts/deploy.py", &deploy_script(file_name))?;

    tracing::info!("Ape project written to {}", root.display());
    Ok(root)
}

fn write_file(root: &Path, relative: &str, content: &str) -> Result<(), ScaffoldError> {
    let path = root.join(relative);
    fs::write(&path, content).map_err(|source| ScaffoldError::Io { path, source })
}

fn contract_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

fn ape_config(project_name: &str, language: Option<Language>) -> String {
    let plugin = language.unwrap_or(Language::Solidity).ape_plugin();
    let mut config = format!("name: {project_name}\n\nplugins:\n  - name: {plugin}\n");

    if language == Some(Language::Solidity) {
        config.push_str(
            "
dependencies:
  - name: openzeppelin
    github: OpenZeppelin/openzeppelin-contracts
    version: 5.0.2

solidity:
  import_remapping:
    - \"@openzeppelin/contracts=openzeppelin/v5.0.2\"
",
        );
    }
    config
}

fn readme(project_name: &str, file_name: &str) -> String {
    format!(
        "# {project_name}

Ape project generated by sneko around `contracts/{file_name}`.

## Getting started

```sh
pip install eth-ape
ape plugins install .
ape compile
ape test
ape run deploy
```
"
    )
}

const CONFTEST: &str = "import pytest


@pytest.fixture
def owner(accounts):
    return accounts[0]
";

fn smoke_test(file_name: &str) -> String {
    let name = contract_name(file_name);
    format!(
        "def test_contract_type_is_available(project):
    assert project.{name} is not None
"
    )
}

fn deploy_script(file_name: &str) -> String {
    let name = contract_name(file_name);
    format!(
        "from ape import accounts, project


def main():
    account = accounts.test_accounts[0]
    # pass constructor arguments after the sender if the contract needs them
    contract = project.{name}.deploy(sender=account)
    print(f\"{name} deployed at {{contract.address}}\")
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GREETER: &str = "pragma solidity ^0.8.0;\ncontract Greeter {}\n";

    #[test]
    fn test_layout() {
        let dir = TempDir::new().unwrap();
        let root =
            build_ape_project(dir.path(), DEFAULT_PROJECT_NAME, "Greeter.sol", GREETER).unwrap();

        assert_eq!(root, dir.path().join("sneko-ape-project"));
        for dir in ["contracts", "tests", "scripts"] {
            assert!(root.join(dir).is_dir(), "{dir}");
        }
        for file in [
            ".gitignore",
            "README.md",
            "ape-config.yaml",
            "tests/conftest.py",
            "tests/test_smoke.py",
            "scripts/deploy.py",
        ] {
            assert!(root.join(file).is_file(), "{file}");
        }
        assert_eq!(
            fs::read_to_string(root.join("contracts/Greeter.sol")).unwrap(),
            GREETER
        );
        assert!(fs::read_to_string(root.join(".gitignore"))
            .unwrap()
            .starts_with("# Ape stuff\n.build/\n"));
        assert!(fs::read_to_string(root.join("scripts/deploy.py"))
            .unwrap()
            .contains("project.Greeter.deploy(sender=account)"));
    }

    #[test]
    fn test_solidity_config_includes_openzeppelin() {
        let dir = TempDir::new().unwrap();
        let root = build_ape_project(dir.path(), "demo", "Greeter.sol", GREETER).unwrap();
        let config = fs::read_to_string(root.join(APE_CONFIG_FILE_NAME)).unwrap();
        assert!(config.starts_with("name: demo\n\nplugins:\n  - name: solidity\n"));
        assert!(config.contains("github: OpenZeppelin/openzeppelin-contracts"));
        assert!(config.contains("import_remapping:"));
    }

    #[test]
    fn test_vyper_config() {
        let dir = TempDir::new().unwrap();
        let root = build_ape_project(dir.path(), "demo", "token.vy", "# vyper").unwrap();
        let config = fs::read_to_string(root.join(APE_CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, "name: demo\n\nplugins:\n  - name: vyper\n");
    }

    #[test]
    fn test_existing_directory_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join(DEFAULT_PROJECT_NAME);
        fs::create_dir(&existing).unwrap();
        fs::write(existing.join("keep.txt"), "mine").unwrap();

        let err =
            build_ape_project(dir.path(), DEFAULT_PROJECT_NAME, "Greeter.sol", GREETER).unwrap_err();
        assert!(matches!(err, ScaffoldError::AlreadyExists(path) if path == existing));

        let entries: Vec<_> = fs::read_dir(&existing).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read_to_string(existing.join("keep.txt")).unwrap(), "mine");
    }
}
