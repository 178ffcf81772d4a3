use std::path::{Path, PathBuf};

const PE_OFFSET: usize = 0x80;

#[derive(Debug, Clone, Copy)]
pub struct PeLayout {
    pub machine: u16,
    pub magic: u16,
    pub characteristics: u16,
}

impl PeLayout {
    pub fn x64() -> Self {
        Self {
            machine: 0x8664,
            magic: 0x020b,
            characteristics: 0x0022,
        }
    }

    pub fn x86() -> Self {
        Self {
            machine: 0x014c,
            magic: 0x010b,
            characteristics: 0x0102,
        }
    }
}

pub fn pe_image(layout: PeLayout, len: usize) -> Vec<u8> {
    let mut bytes = vec![0_u8; len.max(PE_OFFSET + 0x100)];
    bytes[0] = b'M';
    bytes[1] = b'Z';
    bytes[0x3c..0x40].copy_from_slice(&(PE_OFFSET as u32).to_le_bytes());
    bytes[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
    let coff = PE_OFFSET + 4;
    bytes[coff..coff + 2].copy_from_slice(&layout.machine.to_le_bytes());
    bytes[coff + 16..coff + 18].copy_from_slice(&0x00f0_u16.to_le_bytes());
    bytes[coff + 18..coff + 20].copy_from_slice(&layout.characteristics.to_le_bytes());
    bytes[coff + 20..coff + 22].copy_from_slice(&layout.magic.to_le_bytes());
    bytes
}

pub fn write_pe(dir: &Path, name: &str, layout: PeLayout, len: usize) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, pe_image(layout, len)).unwrap();
    path
}

pub fn write_exe(dir: &Path, name: &str, len: usize) -> PathBuf {
    write_pe(dir, name, PeLayout::x64(), len)
}

pub fn write_dll(dir: &Path, name: &str, len: usize) -> PathBuf {
    let layout = PeLayout {
        characteristics: 0x2022,
        ..PeLayout::x64()
    };
    write_pe(dir, name, layout, len)
}
