#![allow(dead_code)]

use std::path::{Path, PathBuf};

use yuko_core::config::{Config, ResolverPolicy};

const PE_OFFSET: usize = 0x80;

/// Minimal 64-bit PE executable padded to `len` bytes.
pub fn write_exe(dir: &Path, name: &str, len: usize) -> PathBuf {
    let mut bytes = vec![0_u8; len.max(PE_OFFSET + 0x100)];
    bytes[0] = b'M';
    bytes[1] = b'Z';
    bytes[0x3c..0x40].copy_from_slice(&(PE_OFFSET as u32).to_le_bytes());
    bytes[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
    let coff = PE_OFFSET + 4;
    bytes[coff..coff + 2].copy_from_slice(&0x8664_u16.to_le_bytes());
    bytes[coff + 16..coff + 18].copy_from_slice(&0x00f0_u16.to_le_bytes());
    bytes[coff + 18..coff + 20].copy_from_slice(&0x0022_u16.to_le_bytes());
    bytes[coff + 20..coff + 22].copy_from_slice(&0x020b_u16.to_le_bytes());

    let path = dir.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Shell link whose `LinkInfo` points at `target`.
pub fn write_link(dir: &Path, name: &str, target: &Path) -> PathBuf {
    const LINK_CLSID: [u8; 16] = [
        0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x46,
    ];
    let base = target.to_str().unwrap();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0x4c_u32.to_le_bytes());
    bytes.extend_from_slice(&LINK_CLSID);
    bytes.extend_from_slice(&0x82_u32.to_le_bytes());
    bytes.resize(0x4c, 0);

    let header = 0x1c_u32;
    let suffix_offset = header + base.len() as u32 + 1;
    for field in [suffix_offset + 1, header, 1, 0, header, 0, suffix_offset] {
        bytes.extend_from_slice(&field.to_le_bytes());
    }
    bytes.extend_from_slice(base.as_bytes());
    bytes.push(0);
    bytes.push(0);

    let path = dir.join(name);
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Size floors small enough for synthetic binaries.
pub fn small_policy() -> ResolverPolicy {
    ResolverPolicy {
        min_main_exe_bytes: 1_000,
        min_real_exe_bytes: 2_000,
        min_walk_exe_bytes: 1_000,
        ..ResolverPolicy::default()
    }
}

/// Stores under `base`, no discovery roots.
pub fn config_in(base: &Path) -> Config {
    Config {
        start_menu_roots: Vec::new(),
        program_roots: Vec::new(),
        search_roots: Vec::new(),
        policy: small_policy(),
        ..Config::rooted_at(base)
    }
}
