//! Synthetic PE images for tests.
//!
//! Images are laid out as: DOS header (64 bytes), PE signature, COFF header,
//! optional header with 16 data directories, an optional `.text` section
//! header, and the CLR runtime header at file offset 0x200.

#![allow(dead_code)]

use object::pe;

pub const I386: u16 = pe::IMAGE_FILE_MACHINE_I386;
pub const AMD64: u16 = pe::IMAGE_FILE_MACHINE_AMD64;
pub const ARM64: u16 = pe::IMAGE_FILE_MACHINE_ARM64;
pub const ARMNT: u16 = pe::IMAGE_FILE_MACHINE_ARMNT;

pub const IL_ONLY: u32 = pe::COMIMAGE_FLAGS_ILONLY;
pub const REQUIRED_32BIT: u32 = pe::COMIMAGE_FLAGS_32BITREQUIRED;
pub const PREFERRED_32BIT: u32 = pe::COMIMAGE_FLAGS_32BITPREFERRED;

const PE_OFFSET: u32 = 64;
const CLR_RVA: u32 = 0x2000;
const SECTION_FILE_OFFSET: u32 = 0x200;
const CLR_HEADER_SIZE: u32 = 72;

/// Builder for a minimal PE image.
#[derive(Debug, Clone)]
pub struct PeImage {
    machine: u16,
    pe32_plus: bool,
    optional_header: bool,
    cor_flags: Option<u32>,
    clr_rva: u32,
    magic: Option<u16>,
}

impl PeImage {
    /// A native image: no CLR directory.
    pub fn native(machine: u16) -> Self {
        Self {
            machine,
            pe32_plus: false,
            optional_header: true,
            cor_flags: None,
            clr_rva: CLR_RVA,
            magic: None,
        }
    }

    /// A managed image whose CLR header carries `cor_flags`.
    pub fn managed(machine: u16, cor_flags: u32) -> Self {
        Self {
            cor_flags: Some(cor_flags),
            ..Self::native(machine)
        }
    }

    pub fn pe32_plus(mut self, pe32_plus: bool) -> Self {
        self.pe32_plus = pe32_plus;
        self
    }

    pub fn without_optional_header(mut self) -> Self {
        self.optional_header = false;
        self
    }

    /// Points the CLR directory at `rva` instead of the `.text` section.
    pub fn clr_rva(mut self, rva: u32) -> Self {
        self.clr_rva = rva;
        self
    }

    /// Writes `magic` into the optional header; the layout still follows
    /// [`PeImage::pe32_plus`].
    pub fn magic(mut self, magic: u16) -> Self {
        self.magic = Some(magic);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = dos_header();

        let directories_offset: u16 = if self.pe32_plus { 112 } else { 96 };
        let optional_header_size = if self.optional_header {
            directories_offset + 16 * 8
        } else {
            0
        };
        let number_of_sections = u16::from(self.cor_flags.is_some());

        put_u32(&mut out, pe::IMAGE_NT_SIGNATURE);
        put_u16(&mut out, self.machine);
        put_u16(&mut out, number_of_sections);
        out.extend_from_slice(&[0; 12]);
        put_u16(&mut out, optional_header_size);
        put_u16(&mut out, 0);

        if !self.optional_header {
            return out;
        }

        let magic = self.magic.unwrap_or(if self.pe32_plus {
            pe::IMAGE_NT_OPTIONAL_HDR64_MAGIC
        } else {
            pe::IMAGE_NT_OPTIONAL_HDR32_MAGIC
        });
        put_u16(&mut out, magic);
        out.resize(out.len() + usize::from(directories_offset) - 2, 0);

        for index in 0..16 {
            match self.cor_flags {
                Some(_) if index == pe::IMAGE_DIRECTORY_ENTRY_COM_DESCRIPTOR => {
                    put_u32(&mut out, self.clr_rva);
                    put_u32(&mut out, CLR_HEADER_SIZE);
                }
                _ => out.extend_from_slice(&[0; 8]),
            }
        }

        let Some(cor_flags) = self.cor_flags else {
            return out;
        };

        out.extend_from_slice(b".text\0\0\0");
        put_u32(&mut out, 0x1000); // VirtualSize
        put_u32(&mut out, CLR_RVA); // VirtualAddress
        put_u32(&mut out, 0x200); // SizeOfRawData
        put_u32(&mut out, SECTION_FILE_OFFSET); // PointerToRawData
        out.extend_from_slice(&[0; 16]);

        out.resize(SECTION_FILE_OFFSET as usize, 0);
        put_u32(&mut out, CLR_HEADER_SIZE);
        put_u16(&mut out, 2);
        put_u16(&mut out, 5);
        out.extend_from_slice(&[0; 8]); // MetaData
        put_u32(&mut out, cor_flags);
        out.resize(SECTION_FILE_OFFSET as usize + CLR_HEADER_SIZE as usize, 0);

        out
    }
}

/// Starts with zeros instead of "MZ".
pub fn invalid_mz() -> Vec<u8> {
    vec![0; 64]
}

/// Valid DOS header, but no "PE\0\0" at the declared offset.
pub fn invalid_pe_signature() -> Vec<u8> {
    let mut out = dos_header();
    put_u32(&mut out, 0);
    out
}

/// Valid DOS header, file ends where the PE header should start.
pub fn truncated_before_pe_header() -> Vec<u8> {
    dos_header()
}

fn dos_header() -> Vec<u8> {
    let mut out = Vec::with_capacity(0x300);
    put_u16(&mut out, pe::IMAGE_DOS_SIGNATURE);
    out.resize(0x3C, 0);
    put_u32(&mut out, PE_OFFSET);
    out
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}
