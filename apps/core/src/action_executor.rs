use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{info, warn};

use crate::model::Resolution;
use crate::resolver::Resolver;
use crate::system_commands;
use crate::validator;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("empty application name")]
    EmptyName,
    #[error("application not found: {0}")]
    NotFound(String),
    #[error("not a launchable executable: {}", .0.display())]
    InvalidExecutable(PathBuf),
    #[error("failed to start {target}: {source}")]
    SpawnFailed {
        target: String,
        source: std::io::Error,
    },
}

pub fn launch_target(target: &str, args: &[String]) -> Result<(), LaunchError> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(LaunchError::EmptyName);
    }
    if !system_commands::is_bare_token(trimmed) && !validator::is_valid_str(trimmed) {
        return Err(LaunchError::InvalidExecutable(PathBuf::from(trimmed)));
    }

    let mut command = Command::new(trimmed);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach(&mut command);

    command
        .spawn()
        .map(|_child| ())
        .map_err(|source| LaunchError::SpawnFailed {
            target: trimmed.to_string(),
            source,
        })
}

pub fn launch(
    resolver: &mut Resolver,
    name: &str,
    args: &[String],
) -> Result<Resolution, LaunchError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LaunchError::EmptyName);
    }
    let resolution = resolver
        .resolve(name)
        .ok_or_else(|| LaunchError::NotFound(name.to_string()))?;
    launch_target(&resolution.target, args)?;
    info!(
        name,
        target = %resolution.target,
        source = resolution.source.label(),
        "application started"
    );
    Ok(resolution)
}

pub fn launch_app(resolver: &mut Resolver, name: &str, args: &[String]) -> bool {
    match launch(resolver, name, args) {
        Ok(_) => true,
        Err(error) => {
            warn!(name, %error, "launch failed");
            false
        }
    }
}

pub fn open_app(resolver: &mut Resolver, name: &str) -> bool {
    launch_app(resolver, name, &[])
}

#[cfg(target_os = "windows")]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    use windows_sys::Win32::System::Threading::{CREATE_NEW_PROCESS_GROUP, DETACHED_PROCESS};

    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(target_os = "windows"))]
fn detach(_command: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::{launch, launch_app, launch_target, LaunchError};
    use crate::aliases::AliasStore;
    use crate::app_cache::AppPathCache;
    use crate::config::ResolverPolicy;
    use crate::resolver::{LiveSources, Resolver};

    fn empty_resolver() -> Resolver {
        Resolver::new(
            Vec::new(),
            AliasStore::in_memory(),
            AppPathCache::in_memory(),
            LiveSources::none(),
            ResolverPolicy::default(),
        )
    }

    #[test]
    fn blank_name_is_rejected_before_resolution() {
        let mut resolver = empty_resolver();
        assert!(matches!(launch(&mut resolver, "   ", &[]), Err(LaunchError::EmptyName)));
    }

    #[test]
    fn unknown_name_is_not_found_without_side_effects() {
        let mut resolver = empty_resolver();
        let result = launch(&mut resolver, "nonexistent program", &[]);
        assert!(matches!(result, Err(LaunchError::NotFound(name)) if name == "nonexistent program"));
        assert!(!launch_app(&mut resolver, "nonexistent program", &[]));
    }

    #[test]
    fn non_executable_targets_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("readme.exe");
        std::fs::write(&text, "hello").unwrap();

        let result = launch_target(text.to_str().unwrap(), &[]);
        assert!(matches!(result, Err(LaunchError::InvalidExecutable(path)) if path == text));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn spawn_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let exe = crate::test_support::write_exe(dir.path(), "app.exe", 4_096);

        let result = launch_target(exe.to_str().unwrap(), &["--flag".to_string()]);
        assert!(matches!(result, Err(LaunchError::SpawnFailed { .. })));
    }
}
