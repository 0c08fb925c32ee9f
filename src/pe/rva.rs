//! RVA translation through the section table.

use super::{CoffHeader, ReadExt};
use crate::pe::arch::CorFlags;
use log::{debug, warn};
use object::pe;
use std::io::{Read, Seek, SeekFrom};

/// Size of the PE signature plus the COFF file header.
const NT_HEADERS_PREFIX: u64 = 4 + pe::IMAGE_SIZEOF_FILE_HEADER as u64;

/// Section header length in the section table.
const SECTION_HEADER_SIZE: u64 = pe::IMAGE_SIZEOF_SECTION_HEADER as u64;

/// Offset of the flags field inside the CLR runtime header.
const COR20_FLAGS_OFFSET: u64 = 16;

/// The part of a section header needed to map RVAs to file offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub virtual_address: u32,
    pub virtual_size: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
}

impl SectionHeader {
    /// Reads a section header at the current position.
    fn read<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut name = [0u8; 8];
        reader.read_exact(&mut name)?;

        let virtual_size = reader.read_u32_le()?;
        let virtual_address = reader.read_u32_le()?;
        let size_of_raw_data = reader.read_u32_le()?;
        let pointer_to_raw_data = reader.read_u32_le()?;

        Ok(Self {
            virtual_address,
            virtual_size,
            size_of_raw_data,
            pointer_to_raw_data,
        })
    }

    /// Maps `rva` to a file offset if it falls inside this section.
    pub fn file_offset(&self, rva: u32) -> Option<u64> {
        let start = u64::from(self.virtual_address);
        let end = start + u64::from(self.virtual_size);
        let rva = u64::from(rva);

        (start <= rva && rva < end).then(|| u64::from(self.pointer_to_raw_data) + (rva - start))
    }
}

/// Locates the CLR runtime header at `clr_rva` and reads its flags.
///
/// Returns `None` when no section covers the RVA.
pub(crate) fn read_cor_flags<R: Read + Seek>(
    reader: &mut R,
    pe_offset: u64,
    coff: &CoffHeader,
    clr_rva: u32,
) -> crate::Result<Option<CorFlags>> {
    let table_start = pe_offset + NT_HEADERS_PREFIX + u64::from(coff.size_of_optional_header);

    for index in 0..u64::from(coff.number_of_sections) {
        reader.seek(SeekFrom::Start(table_start + index * SECTION_HEADER_SIZE))?;
        let section = SectionHeader::read(reader)?;

        let Some(offset) = section.file_offset(clr_rva) else {
            continue;
        };

        debug!(
            "CLR header RVA {:#X} in section {} at file offset {:#X}",
            clr_rva, index, offset
        );

        reader.seek(SeekFrom::Start(offset + COR20_FLAGS_OFFSET))?;
        let flags = reader.read_u32_le()?;
        return Ok(Some(CorFlags::from_bits_retain(flags)));
    }

    warn!(
        "CLR header RVA {:#X} not found in any of {} sections",
        clr_rva, coff.number_of_sections
    );
    Ok(None)
}
