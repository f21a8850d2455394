//! Side files mounted into the container at creation time.

use std::{
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use crate::{
    RedpandaError, Settings,
    config::render_bootstrap_config,
    constants::{BOOTSTRAP_CONFIG_PATH, ENTRYPOINT_PATH, MOUNTED_FILE_MODE},
    runtime::{ContainerFile, set_mode},
};

/// Script that blocks until the node config is in place, then execs the image entrypoint.
pub const ENTRYPOINT_SCRIPT: &[u8] = include_bytes!("mounts/entrypoint.sh");

/// Temporary host files holding the staged entrypoint and the cluster bootstrap config.
///
/// The files are removed when this value is dropped, so it has to outlive container creation.
#[derive(Debug)]
pub struct SideFiles {
    entrypoint: NamedTempFile,
    bootstrap_config: NamedTempFile,
}

impl SideFiles {
    /// Writes the entrypoint script and the rendered bootstrap config to temporary files.
    pub fn create(settings: &Settings) -> Result<Self, RedpandaError> {
        let entrypoint = write_temp_file("redpanda-entrypoint-", ENTRYPOINT_SCRIPT)
            .map_err(RedpandaError::EntrypointFile)?;

        let bootstrap = render_bootstrap_config(settings).map_err(RedpandaError::BootstrapConfig)?;
        let bootstrap_config = write_temp_file("redpanda-bootstrap-", &bootstrap)
            .map_err(RedpandaError::BootstrapFile)?;

        Ok(Self { entrypoint, bootstrap_config })
    }

    /// Returns the host path of the entrypoint script.
    pub fn entrypoint_path(&self) -> &Path {
        self.entrypoint.path()
    }

    /// Returns the host path of the bootstrap config.
    pub fn bootstrap_config_path(&self) -> &Path {
        self.bootstrap_config.path()
    }

    /// Returns the container mounts for both files.
    pub fn container_files(&self) -> Vec<ContainerFile> {
        vec![
            ContainerFile {
                host_path: self.entrypoint_path().to_path_buf(),
                container_path: ENTRYPOINT_PATH.to_string(),
                mode: MOUNTED_FILE_MODE,
            },
            ContainerFile {
                host_path: self.bootstrap_config_path().to_path_buf(),
                container_path: BOOTSTRAP_CONFIG_PATH.to_string(),
                mode: MOUNTED_FILE_MODE,
            },
        ]
    }
}

fn write_temp_file(prefix: &str, contents: &[u8]) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().prefix(prefix).tempfile()?;
    file.write_all(contents)?;
    file.flush()?;
    set_mode(file.path(), MOUNTED_FILE_MODE)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NODE_CONFIG_MARKER, NODE_CONFIG_PATH};

    #[test]
    fn script_waits_for_node_config_marker() {
        let script = std::str::from_utf8(ENTRYPOINT_SCRIPT).unwrap();

        assert!(script.starts_with("#!"));
        assert!(script.contains(NODE_CONFIG_MARKER));
        assert!(script.contains(NODE_CONFIG_PATH));
        assert!(script.contains("exec /entrypoint.sh \"$@\""));
    }

    #[test]
    fn writes_both_files() {
        let settings = Settings::default().with_superusers(["admin"]);
        let files = SideFiles::create(&settings).unwrap();

        assert_eq!(std::fs::read(files.entrypoint_path()).unwrap(), ENTRYPOINT_SCRIPT);
        let bootstrap = std::fs::read_to_string(files.bootstrap_config_path()).unwrap();
        assert!(bootstrap.contains("- admin"));
    }

    #[cfg(unix)]
    #[test]
    fn files_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let files = SideFiles::create(&Settings::default()).unwrap();

        for path in [files.entrypoint_path(), files.bootstrap_config_path()] {
            let mode = std::fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, MOUNTED_FILE_MODE);
        }
    }

    #[test]
    fn mounts_target_fixed_paths() {
        let files = SideFiles::create(&Settings::default()).unwrap();
        let mounts = files.container_files();

        assert_eq!(mounts[0].container_path, ENTRYPOINT_PATH);
        assert_eq!(mounts[0].host_path, files.entrypoint_path());
        assert_eq!(mounts[1].container_path, BOOTSTRAP_CONFIG_PATH);
        assert!(mounts.iter().all(|file| file.mode == MOUNTED_FILE_MODE));
    }

    #[test]
    fn files_are_removed_on_drop() {
        let files = SideFiles::create(&Settings::default()).unwrap();
        let paths =
            [files.entrypoint_path().to_path_buf(), files.bootstrap_config_path().to_path_buf()];

        drop(files);

        assert!(paths.iter().all(|path| !path.exists()));
    }
}
