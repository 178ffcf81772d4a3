use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

const DOS_HEADER_LEN: usize = 64;
const PE_OFFSET_FIELD: usize = 0x3c;
const MAX_PE_OFFSET: u32 = 0x10000;
// PE signature, COFF file header, optional header magic.
const NT_PREFIX_LEN: usize = 4 + 20 + 2;

const IMAGE_FILE_MACHINE_I386: u16 = 0x014c;
const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;
const IMAGE_FILE_MACHINE_ARM64: u16 = 0xaa64;
const PE32_MAGIC: u16 = 0x010b;
const PE32_PLUS_MAGIC: u16 = 0x020b;
const IMAGE_FILE_EXECUTABLE_IMAGE: u16 = 0x0002;
const IMAGE_FILE_DLL: u16 = 0x2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSize {
    Bits32,
    Bits64,
}

pub fn is_valid(path: &Path) -> bool {
    inspect(path).is_some()
}

pub fn is_valid_str(path: &str) -> bool {
    let trimmed = path.trim();
    !trimmed.is_empty() && is_valid(Path::new(trimmed))
}

pub fn inspect(path: &Path) -> Option<WordSize> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }

    let mut file = File::open(path).ok()?;
    let mut dos = [0_u8; DOS_HEADER_LEN];
    file.read_exact(&mut dos).ok()?;
    if &dos[..2] != b"MZ" {
        return None;
    }

    let pe_offset = u32::from_le_bytes([
        dos[PE_OFFSET_FIELD],
        dos[PE_OFFSET_FIELD + 1],
        dos[PE_OFFSET_FIELD + 2],
        dos[PE_OFFSET_FIELD + 3],
    ]);
    if pe_offset > MAX_PE_OFFSET
        || u64::from(pe_offset) + NT_PREFIX_LEN as u64 > metadata.len()
    {
        return None;
    }

    file.seek(SeekFrom::Start(u64::from(pe_offset))).ok()?;
    let mut nt = [0_u8; NT_PREFIX_LEN];
    file.read_exact(&mut nt).ok()?;
    parse_nt_prefix(&nt)
}

fn parse_nt_prefix(nt: &[u8; NT_PREFIX_LEN]) -> Option<WordSize> {
    if &nt[..4] != b"PE\0\0" {
        return None;
    }

    let machine = read_u16(nt, 4);
    let optional_header_size = read_u16(nt, 20);
    let characteristics = read_u16(nt, 22);
    if optional_header_size < 2 {
        return None;
    }
    if characteristics & IMAGE_FILE_EXECUTABLE_IMAGE == 0 || characteristics & IMAGE_FILE_DLL != 0
    {
        return None;
    }

    let magic = read_u16(nt, 24);
    match (machine, magic) {
        (IMAGE_FILE_MACHINE_I386, PE32_MAGIC) => Some(WordSize::Bits32),
        (IMAGE_FILE_MACHINE_AMD64 | IMAGE_FILE_MACHINE_ARM64, PE32_PLUS_MAGIC) => {
            Some(WordSize::Bits64)
        }
        _ => None,
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

#[cfg(test)]
mod tests {
    use super::{inspect, is_valid, is_valid_str, WordSize};
    use crate::test_support::{write_dll, write_exe, write_pe, PeLayout};

    #[test]
    fn accepts_64_and_32_bit_executables() {
        let dir = tempfile::tempdir().unwrap();
        let x64 = write_exe(dir.path(), "app64.exe", 4096);
        let x86 = write_pe(dir.path(), "app32.exe", PeLayout::x86(), 4096);

        assert_eq!(inspect(&x64), Some(WordSize::Bits64));
        assert_eq!(inspect(&x86), Some(WordSize::Bits32));
    }

    #[test]
    fn rejects_dlls_and_plain_files() {
        let dir = tempfile::tempdir().unwrap();
        let dll = write_dll(dir.path(), "core.exe", 4096);
        let text = dir.path().join("readme.exe");
        std::fs::write(&text, b"MZ but not really a program").unwrap();

        assert!(!is_valid(&dll));
        assert!(!is_valid(&text));
    }

    #[test]
    fn rejects_mismatched_magic_for_machine() {
        let dir = tempfile::tempdir().unwrap();
        let layout = PeLayout {
            magic: 0x010b,
            ..PeLayout::x64()
        };
        let broken = write_pe(dir.path(), "broken.exe", layout, 4096);
        assert!(!is_valid(&broken));
    }

    #[test]
    fn rejects_missing_directories_and_blank_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_valid(dir.path()));
        assert!(!is_valid(&dir.path().join("absent.exe")));
        assert!(!is_valid_str("   "));
    }

    #[test]
    fn rejects_pe_offset_past_end_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truncated.exe");
        let mut bytes = vec![0_u8; 64];
        bytes[0] = b'M';
        bytes[1] = b'Z';
        bytes[0x3c..0x40].copy_from_slice(&0x200_u32.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        assert!(!is_valid(&path));
    }
}
