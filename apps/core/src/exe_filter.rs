use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::ResolverPolicy;
use crate::validator;

pub const INFRASTRUCTURE_SUBSTRINGS: &[&str] = &[
    "updater",
    "update",
    "crash",
    "dump",
    "helper",
    "streaming_client",
    "streaming-client",
    "unins",
    "uninstall",
    "report",
    "bug",
    "diagnostic",
    "service",
    "watcher",
    "tray",
    "bootstrapper",
    "installer",
    "setup",
];

pub const STUB_FILE_NAMES: &[&str] = &[
    "update.exe",
    "launcher.exe",
    "install.exe",
    "setup.exe",
    "uninstall.exe",
    "unins000.exe",
];

pub const NON_APP_FILE_NAMES: &[&str] = &[
    "unins000.exe",
    "uninstall.exe",
    "setup.exe",
    "install.exe",
    "vc_redist.x86.exe",
    "vc_redist.x64.exe",
];

pub fn has_exe_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("exe"))
        .unwrap_or(false)
}

pub fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

pub fn file_stem_lower(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

pub fn is_stub_name(path: &Path) -> bool {
    STUB_FILE_NAMES.contains(&file_name_lower(path).as_str())
}

pub fn is_non_app_name(path: &Path) -> bool {
    NON_APP_FILE_NAMES.contains(&file_name_lower(path).as_str())
}

pub fn has_infrastructure_name(path: &Path) -> bool {
    let stem = file_stem_lower(path);
    INFRASTRUCTURE_SUBSTRINGS
        .iter()
        .any(|needle| stem.contains(needle))
}

pub fn is_main_executable(path: &Path, min_bytes: u64) -> bool {
    if has_infrastructure_name(path) {
        return false;
    }
    std::fs::metadata(path)
        .map(|meta| meta.len() >= min_bytes)
        .unwrap_or(false)
}

pub fn is_real_candidate(path: &Path, policy: &ResolverPolicy) -> bool {
    has_exe_extension(path)
        && !is_stub_name(path)
        && file_size(path).map(|len| len >= policy.min_real_exe_bytes).unwrap_or(false)
        && validator::is_valid(path)
        && is_main_executable(path, policy.min_main_exe_bytes)
}

pub fn prefer_real_executable(path: &Path, policy: &ResolverPolicy) -> PathBuf {
    if !is_stub_name(path) {
        return path.to_path_buf();
    }
    let Some(folder) = path.parent() else {
        return path.to_path_buf();
    };
    let Ok(entries) = std::fs::read_dir(folder) else {
        return path.to_path_buf();
    };

    let candidates = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|candidate| is_real_candidate(candidate, policy));

    newest(candidates).unwrap_or_else(|| path.to_path_buf())
}

pub fn newest<I>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut best: Option<(SystemTime, PathBuf)> = None;
    for candidate in candidates {
        let modified = std::fs::metadata(&candidate)
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let replace = best
            .as_ref()
            .map(|(current, _)| modified > *current)
            .unwrap_or(true);
        if replace {
            best = Some((modified, candidate));
        }
    }
    best.map(|(_, path)| path)
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|meta| meta.len())
}
