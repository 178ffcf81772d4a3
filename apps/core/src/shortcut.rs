use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::uninstall_registry::expand_environment_strings;

const HEADER_SIZE: u32 = 0x4c;
const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

const HAS_LINK_TARGET_ID_LIST: u32 = 0x0000_0001;
const HAS_LINK_INFO: u32 = 0x0000_0002;
const HAS_NAME: u32 = 0x0000_0004;
const HAS_RELATIVE_PATH: u32 = 0x0000_0008;
const HAS_WORKING_DIR: u32 = 0x0000_0010;
const IS_UNICODE: u32 = 0x0000_0080;

const VOLUME_ID_AND_LOCAL_BASE_PATH: u32 = 0x0000_0001;
const LINK_INFO_UNICODE_HEADER_SIZE: u32 = 0x24;

#[derive(Debug, Error)]
pub enum ShortcutError {
    #[error("failed to read shortcut {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("not a shell link")]
    NotAShortcut,
    #[error("shell link is truncated")]
    Truncated,
    #[error("shell link has no filesystem target")]
    NoTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellLink {
    pub local_base_path: Option<String>,
    pub common_path_suffix: Option<String>,
    pub name: Option<String>,
    pub relative_path: Option<String>,
    pub working_dir: Option<String>,
}

impl ShellLink {
    pub fn absolute_target(&self) -> Option<String> {
        let base = self.local_base_path.as_deref().filter(|b| !b.is_empty())?;
        let mut target = base.to_string();
        if let Some(suffix) = self.common_path_suffix.as_deref().filter(|s| !s.is_empty()) {
            if !target.ends_with('\\') && !target.ends_with('/') {
                target.push('\\');
            }
            target.push_str(suffix);
        }
        Some(target)
    }
}

pub fn is_shortcut(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("lnk"))
        .unwrap_or(false)
}

pub fn resolve_target(path: &Path) -> Result<PathBuf, ShortcutError> {
    let bytes = std::fs::read(path).map_err(|source| ShortcutError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let link = parse(&bytes)?;

    if let Some(target) = link.absolute_target() {
        return Ok(PathBuf::from(expand_environment_strings(&target)));
    }

    let relative = link
        .relative_path
        .as_deref()
        .filter(|rel| !rel.trim().is_empty())
        .ok_or(ShortcutError::NoTarget)?;
    let expanded = expand_environment_strings(relative);
    let candidate = PathBuf::from(native_separators(&expanded));
    if candidate.is_absolute() {
        return Ok(candidate);
    }
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(base.join(candidate))
}

pub fn parse(bytes: &[u8]) -> Result<ShellLink, ShortcutError> {
    let mut reader = Reader::new(bytes);
    if reader.u32()? != HEADER_SIZE || reader.take(16)? != LINK_CLSID {
        return Err(ShortcutError::NotAShortcut);
    }
    let flags = reader.u32()?;
    reader.seek(HEADER_SIZE as usize)?;

    if flags & HAS_LINK_TARGET_ID_LIST != 0 {
        let id_list_size = reader.u16()? as usize;
        reader.skip(id_list_size)?;
    }

    let mut link = ShellLink::default();
    if flags & HAS_LINK_INFO != 0 {
        read_link_info(&mut reader, &mut link)?;
    }

    let unicode = flags & IS_UNICODE != 0;
    if flags & HAS_NAME != 0 {
        link.name = Some(reader.counted_string(unicode)?);
    }
    if flags & HAS_RELATIVE_PATH != 0 {
        link.relative_path = Some(reader.counted_string(unicode)?);
    }
    if flags & HAS_WORKING_DIR != 0 {
        link.working_dir = Some(reader.counted_string(unicode)?);
    }
    Ok(link)
}

fn read_link_info(reader: &mut Reader<'_>, link: &mut ShellLink) -> Result<(), ShortcutError> {
    let start = reader.pos;
    let size = reader.u32()? as usize;
    let header_size = reader.u32()?;
    let info_flags = reader.u32()?;
    let _volume_id_offset = reader.u32()?;
    let local_base_path_offset = reader.u32()? as usize;
    let _network_link_offset = reader.u32()?;
    let common_path_suffix_offset = reader.u32()? as usize;
    let (unicode_base_offset, unicode_suffix_offset) = if header_size >= LINK_INFO_UNICODE_HEADER_SIZE
    {
        (Some(reader.u32()? as usize), Some(reader.u32()? as usize))
    } else {
        (None, None)
    };

    let block = reader
        .bytes
        .get(start..start.checked_add(size).ok_or(ShortcutError::Truncated)?)
        .ok_or(ShortcutError::Truncated)?;

    if info_flags & VOLUME_ID_AND_LOCAL_BASE_PATH != 0 {
        link.local_base_path = Some(match unicode_base_offset {
            Some(offset) if offset > 0 => utf16_z(block, offset)?,
            _ => ansi_z(block, local_base_path_offset)?,
        });
    }
    link.common_path_suffix = match unicode_suffix_offset {
        Some(offset) if offset > 0 => Some(utf16_z(block, offset)?),
        _ if common_path_suffix_offset > 0 => Some(ansi_z(block, common_path_suffix_offset)?),
        _ => None,
    };

    reader.seek(start + size)
}

fn ansi_z(block: &[u8], offset: usize) -> Result<String, ShortcutError> {
    let tail = block.get(offset..).ok_or(ShortcutError::Truncated)?;
    let end = tail
        .iter()
        .position(|b| *b == 0)
        .ok_or(ShortcutError::Truncated)?;
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}

fn utf16_z(block: &[u8], offset: usize) -> Result<String, ShortcutError> {
    let tail = block.get(offset..).ok_or(ShortcutError::Truncated)?;
    let units: Vec<u16> = tail
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let end = units
        .iter()
        .position(|unit| *unit == 0)
        .ok_or(ShortcutError::Truncated)?;
    Ok(String::from_utf16_lossy(&units[..end]))
}

#[cfg(target_os = "windows")]
fn native_separators(path: &str) -> String {
    path.to_string()
}

#[cfg(not(target_os = "windows"))]
fn native_separators(path: &str) -> String {
    path.replace('\\', "/")
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ShortcutError> {
        let end = self.pos.checked_add(len).ok_or(ShortcutError::Truncated)?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(ShortcutError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ShortcutError> {
        self.take(len).map(|_| ())
    }

    fn seek(&mut self, pos: usize) -> Result<(), ShortcutError> {
        if pos > self.bytes.len() {
            return Err(ShortcutError::Truncated);
        }
        self.pos = pos;
        Ok(())
    }

    fn u16(&mut self) -> Result<u16, ShortcutError> {
        let raw = self.take(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    fn u32(&mut self) -> Result<u32, ShortcutError> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn counted_string(&mut self, unicode: bool) -> Result<String, ShortcutError> {
        let count = self.u16()? as usize;
        if unicode {
            let raw = self.take(count * 2)?;
            let units: Vec<u16> = raw
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            Ok(String::from_utf16_lossy(&units))
        } else {
            let raw = self.take(count)?;
            Ok(String::from_utf8_lossy(raw).into_owned())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::shell_link;
    use super::{parse, resolve_target, utf16_z, ShortcutError};

    #[test]
    fn resolves_local_base_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Discord.exe");
        let lnk = dir.path().join("Discord.lnk");
        std::fs::write(&lnk, shell_link(Some(target.to_str().unwrap()), None)).unwrap();

        assert_eq!(resolve_target(&lnk).unwrap(), target);
    }

    #[test]
    fn falls_back_to_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let lnk = dir.path().join("Tool.lnk");
        std::fs::write(&lnk, shell_link(None, Some("bin\\tool.exe"))).unwrap();

        assert_eq!(
            resolve_target(&lnk).unwrap(),
            dir.path().join("bin").join("tool.exe")
        );
    }

    #[test]
    fn rejects_foreign_and_truncated_files() {
        assert!(matches!(parse(b"no"), Err(ShortcutError::Truncated)));
        assert!(matches!(parse(b"not a link"), Err(ShortcutError::NotAShortcut)));
        let mut bytes = shell_link(Some("C:\\App.exe"), None);
        bytes[4] = 0xff;
        assert!(matches!(parse(&bytes), Err(ShortcutError::NotAShortcut)));

        let full = shell_link(Some("C:\\App.exe"), None);
        assert!(matches!(
            parse(&full[..full.len() - 6]),
            Err(ShortcutError::Truncated)
        ));
    }

    #[test]
    fn unicode_strings_need_a_terminator() {
        assert_eq!(utf16_z(&[b'a', 0, 0, 0], 0).unwrap(), "a");
        assert_eq!(utf16_z(&[0xff, b'a', 0, 0, 0], 1).unwrap(), "a");
        assert!(matches!(utf16_z(&[b'a', 0, b'b'], 0), Err(ShortcutError::Truncated)));
        assert!(matches!(utf16_z(&[b'a', 0], 0), Err(ShortcutError::Truncated)));
    }

    #[test]
    fn link_without_targets_reports_no_target() {
        let dir = tempfile::tempdir().unwrap();
        let lnk = dir.path().join("Empty.lnk");
        std::fs::write(&lnk, shell_link(None, None)).unwrap();
        assert!(matches!(resolve_target(&lnk), Err(ShortcutError::NoTarget)));
    }
}
