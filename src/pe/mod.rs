//! PE (Portable Executable) header decoding.
//!
//! Only the fields needed to tell architectures apart are read: the machine
//! type from the COFF header, the CLR runtime header entry from the data
//! directory, and the CLR flags behind it.

mod arch;
mod rva;

use crate::error::{Error, Result};
use crate::fs::FileSystem;
use log::debug;
use object::pe;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

pub use arch::{Architecture, CorFlags};
pub use rva::SectionHeader;

/// Location of the PE header offset inside the DOS header.
const PE_OFFSET_FIELD: u64 = 0x3C;

/// Size of one data directory entry.
const DATA_DIRECTORY_SIZE: u64 = 8;

/// Fields of the COFF file header used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoffHeader {
    pub machine: u16,
    pub number_of_sections: u16,
    pub size_of_optional_header: u16,
}

impl CoffHeader {
    /// Reads the header that follows the PE signature.
    fn read<R: Read + Seek>(reader: &mut R) -> io::Result<Self> {
        let machine = reader.read_u16_le()?;
        let number_of_sections = reader.read_u16_le()?;
        // TimeDateStamp, PointerToSymbolTable, NumberOfSymbols
        reader.seek(SeekFrom::Current(12))?;
        let size_of_optional_header = reader.read_u16_le()?;
        // Characteristics
        reader.seek(SeekFrom::Current(2))?;

        Ok(Self {
            machine,
            number_of_sections,
            size_of_optional_header,
        })
    }
}

/// Layout variant of the optional header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalHeaderKind {
    Pe32,
    Pe32Plus,
}

impl OptionalHeaderKind {
    /// Picks the layout from the optional header magic.
    ///
    /// Anything other than the PE32+ magic is read with the PE32 layout.
    pub fn from_magic(magic: u16) -> Self {
        match magic {
            pe::IMAGE_NT_OPTIONAL_HDR64_MAGIC => Self::Pe32Plus,
            pe::IMAGE_NT_OPTIONAL_HDR32_MAGIC => Self::Pe32,
            other => {
                debug!("Unexpected optional header magic {:#X}, assuming PE32", other);
                Self::Pe32
            }
        }
    }

    /// Distance from the optional header start to the data directory table.
    pub fn data_directory_offset(self) -> u64 {
        match self {
            Self::Pe32 => 96,
            Self::Pe32Plus => 112,
        }
    }
}

/// A data directory table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDirectory {
    pub virtual_address: u32,
    pub size: u32,
}

impl DataDirectory {
    /// Returns `true` if the entry points anywhere.
    pub fn is_present(&self) -> bool {
        self.virtual_address != 0 && self.size != 0
    }
}

/// Little-endian integer reads.
pub(crate) trait ReadExt: Read {
    fn read_u16_le(&mut self) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32_le(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_i32_le(&mut self) -> io::Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }
}

impl<R: Read + ?Sized> ReadExt for R {}

fn invalid_format(detail: &str) -> Error {
    debug!("Rejecting file: {}", detail);
    Error::InvalidFormat("not a valid PE file".to_string())
}

/// Decodes the architecture of the PE image behind `reader`.
pub fn read_architecture<R: Read + Seek>(reader: &mut R) -> Result<Architecture> {
    reader.seek(SeekFrom::Start(0))?;
    if reader.read_u16_le()? != pe::IMAGE_DOS_SIGNATURE {
        return Err(invalid_format("missing MZ signature"));
    }

    reader.seek(SeekFrom::Start(PE_OFFSET_FIELD))?;
    let pe_offset = u64::try_from(reader.read_i32_le()?)
        .map_err(|_| invalid_format("negative PE header offset"))?;

    reader.seek(SeekFrom::Start(pe_offset))?;
    if reader.read_u32_le()? != pe::IMAGE_NT_SIGNATURE {
        return Err(invalid_format("missing PE signature"));
    }

    let coff = CoffHeader::read(reader)?;
    debug!(
        "PE header at {:#X}: machine {:#06X}, {} sections, optional header {} bytes",
        pe_offset, coff.machine, coff.number_of_sections, coff.size_of_optional_header
    );

    if coff.size_of_optional_header == 0 {
        return Ok(Architecture::native(coff.machine));
    }

    let optional_header_start = reader.stream_position()?;
    let kind = OptionalHeaderKind::from_magic(reader.read_u16_le()?);

    let clr_entry = optional_header_start
        + kind.data_directory_offset()
        + pe::IMAGE_DIRECTORY_ENTRY_COM_DESCRIPTOR as u64 * DATA_DIRECTORY_SIZE;
    reader.seek(SeekFrom::Start(clr_entry))?;
    let clr = DataDirectory {
        virtual_address: reader.read_u32_le()?,
        size: reader.read_u32_le()?,
    };
    debug!("{:?} optional header, CLR directory {:?}", kind, clr);

    if !clr.is_present() {
        return Ok(Architecture::native(coff.machine));
    }

    Ok(
        match rva::read_cor_flags(reader, pe_offset, &coff, clr.virtual_address)? {
            Some(flags) => Architecture::managed(coff.machine, flags),
            None => Architecture::native(coff.machine),
        },
    )
}

/// Opens `path` through `fs` and decodes its architecture.
///
/// The file is released before returning, whatever the outcome.
pub fn architecture_of(fs: &dyn FileSystem, path: &Path) -> Result<Architecture> {
    if !fs.exists(path) {
        return Err(Error::NotFound {
            input: path.display().to_string(),
            searched_path: false,
        });
    }

    let mut reader = fs.open(path)?;
    read_architecture(&mut reader)
}
