//! Classification of machine types and CLR flags into architecture labels.

use bitflags::bitflags;
use object::pe;
use std::fmt;

bitflags! {
    /// Flags field of the CLR runtime header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CorFlags: u32 {
        const IL_ONLY = pe::COMIMAGE_FLAGS_ILONLY;
        const REQUIRED_32BIT = pe::COMIMAGE_FLAGS_32BITREQUIRED;
        const PREFERRED_32BIT = pe::COMIMAGE_FLAGS_32BITPREFERRED;
    }
}

/// Target architecture of a PE image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86,
    X64,
    Arm64,
    Arm,
    /// Native image with a machine type outside the known set.
    Unknown(u16),
    /// IL-only assembly that runs at the host's bitness.
    AnyCpu,
    /// IL-only assembly that prefers a 32-bit process.
    AnyCpuPrefer32,
    ManagedX86,
    ManagedX64,
    ManagedArm64,
    ManagedArm,
    /// Managed image with a machine type outside the known set.
    ManagedUnknown(u16),
}

impl Architecture {
    /// Classifies an image without managed metadata.
    pub fn native(machine: u16) -> Self {
        match machine {
            pe::IMAGE_FILE_MACHINE_I386 => Self::X86,
            pe::IMAGE_FILE_MACHINE_AMD64 => Self::X64,
            pe::IMAGE_FILE_MACHINE_ARM64 => Self::Arm64,
            pe::IMAGE_FILE_MACHINE_ARMNT => Self::Arm,
            other => Self::Unknown(other),
        }
    }

    /// Classifies a managed image from its machine type and CLR flags.
    ///
    /// Compilers stamp architecture-neutral IL with the x86 machine type, so
    /// only the IL-only x86 case consults the 32-bit flags.
    pub fn managed(machine: u16, flags: CorFlags) -> Self {
        if machine == pe::IMAGE_FILE_MACHINE_I386 && flags.contains(CorFlags::IL_ONLY) {
            return if flags.contains(CorFlags::PREFERRED_32BIT) {
                Self::AnyCpuPrefer32
            } else if flags.contains(CorFlags::REQUIRED_32BIT) {
                Self::ManagedX86
            } else {
                Self::AnyCpu
            };
        }

        match machine {
            pe::IMAGE_FILE_MACHINE_I386 => Self::ManagedX86,
            pe::IMAGE_FILE_MACHINE_AMD64 => Self::ManagedX64,
            pe::IMAGE_FILE_MACHINE_ARM64 => Self::ManagedArm64,
            pe::IMAGE_FILE_MACHINE_ARMNT => Self::ManagedArm,
            other => Self::ManagedUnknown(other),
        }
    }

    /// Returns `true` for .NET assemblies.
    pub fn is_managed(&self) -> bool {
        !matches!(
            self,
            Self::X86 | Self::X64 | Self::Arm64 | Self::Arm | Self::Unknown(_)
        )
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86 => f.write_str("x86"),
            Self::X64 => f.write_str("x64"),
            Self::Arm64 => f.write_str("ARM64"),
            Self::Arm => f.write_str("ARM"),
            Self::Unknown(machine) => write!(f, "Unknown (0x{machine:04X})"),
            Self::AnyCpu => f.write_str("AnyCPU (.NET)"),
            Self::AnyCpuPrefer32 => f.write_str("AnyCPU (.NET - 32-bit preferred)"),
            Self::ManagedX86 => f.write_str("x86 (.NET)"),
            Self::ManagedX64 => f.write_str("x64 (.NET)"),
            Self::ManagedArm64 => f.write_str("ARM64 (.NET)"),
            Self::ManagedArm => f.write_str("ARM (.NET)"),
            Self::ManagedUnknown(machine) => write!(f, "Unknown (.NET, 0x{machine:04X})"),
        }
    }
}
