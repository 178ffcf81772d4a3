use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ResolverPolicy;
use crate::discovery::SourceError;
use crate::exe_filter;
use crate::validator;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallRecord {
    pub display_name: String,
    pub display_icon: Option<String>,
    pub install_location: Option<String>,
}

impl UninstallRecord {
    pub fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.trim().to_string(),
            ..Self::default()
        }
    }

    pub fn with_icon(mut self, display_icon: &str) -> Self {
        self.display_icon = Some(display_icon.to_string());
        self
    }

    pub fn with_install_location(mut self, install_location: &str) -> Self {
        self.install_location = Some(install_location.to_string());
        self
    }
}

pub trait UninstallSource: Send + Sync {
    fn source_name(&self) -> &'static str;
    fn records(&self) -> Result<Vec<UninstallRecord>, SourceError>;
}

#[derive(Debug, Default)]
pub struct RegistryUninstallSource;

impl UninstallSource for RegistryUninstallSource {
    fn source_name(&self) -> &'static str {
        "uninstall-registry"
    }

    fn records(&self) -> Result<Vec<UninstallRecord>, SourceError> {
        load_records()
    }
}

#[derive(Debug, Default)]
pub struct StaticUninstallSource {
    records: Vec<UninstallRecord>,
}

impl StaticUninstallSource {
    pub fn from_records(records: Vec<UninstallRecord>) -> Self {
        Self { records }
    }
}

impl UninstallSource for StaticUninstallSource {
    fn source_name(&self) -> &'static str {
        "static-uninstall"
    }

    fn records(&self) -> Result<Vec<UninstallRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

pub fn icon_executable(display_icon: &str) -> Option<PathBuf> {
    let raw = display_icon.split(',').next()?.trim().trim_matches('"').trim();
    if raw.is_empty() {
        return None;
    }
    Some(PathBuf::from(expand_environment_strings(raw)))
}

pub fn derive_executable(record: &UninstallRecord, policy: &ResolverPolicy) -> Option<PathBuf> {
    let from_icon = record
        .display_icon
        .as_deref()
        .and_then(icon_executable)
        .filter(|path| validator::is_valid(path));

    let initial = match from_icon {
        Some(path) => path,
        None => {
            let location = record.install_location.as_deref()?;
            let location = expand_environment_strings(location.trim().trim_matches('"'));
            if location.is_empty() {
                return None;
            }
            first_main_executable(Path::new(&location), policy)?
        }
    };

    let chosen = exe_filter::prefer_real_executable(&initial, policy);
    if exe_filter::is_non_app_name(&chosen)
        || !exe_filter::is_main_executable(&chosen, policy.min_main_exe_bytes)
    {
        debug!(name = %record.display_name, path = %chosen.display(), "derived path rejected");
        return None;
    }
    Some(chosen)
}

pub fn records_matching<'a>(
    records: &'a [UninstallRecord],
    spoken: &str,
) -> impl Iterator<Item = &'a UninstallRecord> {
    let needle = spoken.trim().to_lowercase();
    records.iter().filter(move |record| {
        !needle.is_empty() && record.display_name.to_lowercase().contains(&needle)
    })
}

fn first_main_executable(dir: &Path, policy: &ResolverPolicy) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| exe_filter::has_exe_extension(path))
        .collect();
    files.sort();
    files.into_iter().find(|path| {
        validator::is_valid(path) && exe_filter::is_main_executable(path, policy.min_main_exe_bytes)
    })
}

fn load_records() -> Result<Vec<UninstallRecord>, SourceError> {
    #[cfg(target_os = "windows")]
    {
        load_records_windows()
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(SourceError::Unavailable(
            "uninstall registry is only available on Windows".to_string(),
        ))
    }
}

#[cfg(target_os = "windows")]
pub fn expand_environment_strings(input: &str) -> String {
    use windows_sys::Win32::System::Environment::ExpandEnvironmentStringsW;

    if !input.contains('%') {
        return input.to_string();
    }

    let input_wide = to_wide(input);
    let needed = unsafe { ExpandEnvironmentStringsW(input_wide.as_ptr(), std::ptr::null_mut(), 0) };
    if needed == 0 {
        return input.to_string();
    }

    let mut output = vec![0_u16; needed as usize];
    let written =
        unsafe { ExpandEnvironmentStringsW(input_wide.as_ptr(), output.as_mut_ptr(), needed) };
    if written == 0 {
        return input.to_string();
    }

    while output.last().copied() == Some(0) {
        output.pop();
    }
    String::from_utf16_lossy(&output)
}

#[cfg(not(target_os = "windows"))]
pub fn expand_environment_strings(input: &str) -> String {
    if !input.contains('%') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('%') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match std::env::var(name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => {
                out.push('%');
                out.push_str(name);
                out.push('%');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(target_os = "windows")]
fn load_records_windows() -> Result<Vec<UninstallRecord>, SourceError> {
    use windows_sys::Win32::System::Registry::{
        HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_WOW64_32KEY,
    };

    let branches = [
        ("hklm", HKEY_LOCAL_MACHINE, 0),
        ("hklm32", HKEY_LOCAL_MACHINE, KEY_WOW64_32KEY),
        ("hkcu", HKEY_CURRENT_USER, 0),
    ];

    let mut records = Vec::new();
    let mut failures = Vec::new();
    for (hive_label, root, view_flags) in branches {
        if let Err(error) = collect_records_from_branch(hive_label, root, view_flags, &mut records)
        {
            debug!(hive = hive_label, %error, "uninstall branch skipped");
            failures.push(error);
        }
    }

    if records.is_empty() && failures.len() == branches.len() {
        return Err(SourceError::Unavailable(failures.join("; ")));
    }
    Ok(records)
}

#[cfg(target_os = "windows")]
fn collect_records_from_branch(
    hive_label: &str,
    root: windows_sys::Win32::System::Registry::HKEY,
    view_flags: u32,
    out: &mut Vec<UninstallRecord>,
) -> Result<(), String> {
    use windows_sys::Win32::Foundation::{
        ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS,
    };
    use windows_sys::Win32::System::Registry::{
        RegCloseKey, RegEnumKeyExW, RegOpenKeyExW, RegQueryInfoKeyW, HKEY, KEY_READ,
    };

    const UNINSTALL_SUBKEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Uninstall";

    let mut branch: HKEY = std::ptr::null_mut();
    let subkey_wide = to_wide(UNINSTALL_SUBKEY);
    let open_status = unsafe {
        RegOpenKeyExW(
            root,
            subkey_wide.as_ptr(),
            0,
            KEY_READ | view_flags,
            &mut branch,
        )
    };

    if open_status == ERROR_FILE_NOT_FOUND {
        return Ok(());
    }
    if open_status != ERROR_SUCCESS {
        return Err(format!(
            "failed to open uninstall branch ({hive_label}) with code {open_status}"
        ));
    }

    let mut subkey_count = 0_u32;
    let mut max_subkey_len = 0_u32;
    let info_status = unsafe {
        RegQueryInfoKeyW(
            branch,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            &mut subkey_count,
            &mut max_subkey_len,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    if info_status != ERROR_SUCCESS {
        unsafe {
            RegCloseKey(branch);
        }
        return Err(format!(
            "failed to inspect uninstall branch ({hive_label}) with code {info_status}"
        ));
    }

    let mut name_buffer = vec![0_u16; max_subkey_len as usize + 2];
    for index in 0..subkey_count {
        let mut name_len = max_subkey_len + 1;
        let enum_status = unsafe {
            RegEnumKeyExW(
                branch,
                index,
                name_buffer.as_mut_ptr(),
                &mut name_len,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        if enum_status == ERROR_NO_MORE_ITEMS {
            break;
        }
        if enum_status != ERROR_SUCCESS {
            continue;
        }

        let subkey_name = String::from_utf16_lossy(&name_buffer[..name_len as usize]);
        if let Some(record) = read_record(branch, view_flags, &subkey_name) {
            out.push(record);
        }
    }

    unsafe {
        RegCloseKey(branch);
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn read_record(
    branch: windows_sys::Win32::System::Registry::HKEY,
    view_flags: u32,
    subkey_name: &str,
) -> Option<UninstallRecord> {
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{RegCloseKey, RegOpenKeyExW, HKEY, KEY_READ};

    let subkey_wide = to_wide(subkey_name);
    let mut app_key: HKEY = std::ptr::null_mut();
    let open_status = unsafe {
        RegOpenKeyExW(
            branch,
            subkey_wide.as_ptr(),
            0,
            KEY_READ | view_flags,
            &mut app_key,
        )
    };
    if open_status != ERROR_SUCCESS {
        return None;
    }

    let display_name = read_reg_string_value(app_key, "DisplayName");
    let display_icon = read_reg_string_value(app_key, "DisplayIcon");
    let install_location = read_reg_string_value(app_key, "InstallLocation");
    unsafe {
        RegCloseKey(app_key);
    }

    let display_name = display_name?;
    Some(UninstallRecord {
        display_name,
        display_icon,
        install_location,
    })
}

#[cfg(target_os = "windows")]
fn read_reg_string_value(
    key: windows_sys::Win32::System::Registry::HKEY,
    value_name: &str,
) -> Option<String> {
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{RegQueryValueExW, REG_EXPAND_SZ, REG_SZ};

    let value_name_wide = to_wide(value_name);
    let mut value_type = 0_u32;
    let mut size = 0_u32;
    let query_status = unsafe {
        RegQueryValueExW(
            key,
            value_name_wide.as_ptr(),
            std::ptr::null(),
            &mut value_type,
            std::ptr::null_mut(),
            &mut size,
        )
    };
    if query_status != ERROR_SUCCESS || size == 0 {
        return None;
    }
    if value_type != REG_SZ && value_type != REG_EXPAND_SZ {
        return None;
    }

    let mut buffer = vec![0_u8; size as usize];
    let read_status = unsafe {
        RegQueryValueExW(
            key,
            value_name_wide.as_ptr(),
            std::ptr::null(),
            &mut value_type,
            buffer.as_mut_ptr(),
            &mut size,
        )
    };
    if read_status != ERROR_SUCCESS {
        return None;
    }

    let wide: Vec<u16> = buffer
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    let value = String::from_utf16_lossy(&wide).trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(target_os = "windows")]
fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}
