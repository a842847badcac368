//! Compute device selection.

use std::fmt;
use std::str::FromStr;

use crate::error::{DlrError, Result};

/// Device specification for model loading and inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    /// CPU device.
    Cpu,
    /// CUDA device with index.
    Cuda(usize),
    /// OpenCL device with index.
    Opencl(usize),
}

impl Device {
    /// Create a CPU device.
    pub fn cpu() -> Self {
        Self::Cpu
    }

    /// Create a CUDA device with the given index.
    pub fn cuda(index: usize) -> Self {
        Self::Cuda(index)
    }

    /// The native runtime's device-type code (DLDeviceType values).
    pub fn type_code(&self) -> i32 {
        match self {
            Self::Cpu => 1,
            Self::Cuda(_) => 2,
            Self::Opencl(_) => 4,
        }
    }

    /// The device ordinal within its type.
    pub fn ordinal(&self) -> i32 {
        match self {
            Self::Cpu => 0,
            Self::Cuda(idx) | Self::Opencl(idx) => *idx as i32,
        }
    }
}

impl FromStr for Device {
    type Err = DlrError;

    /// Parse a device string like "cpu", "cuda", "cuda:1", "opencl:0".
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        if s == "cpu" {
            Ok(Self::Cpu)
        } else if s == "cuda" {
            Ok(Self::Cuda(0))
        } else if let Some(idx) = s.strip_prefix("cuda:") {
            let index: usize = idx
                .parse()
                .map_err(|_| DlrError::config(format!("Invalid CUDA index: {}", idx)))?;
            Ok(Self::Cuda(index))
        } else if let Some(idx) = s.strip_prefix("opencl:") {
            let index: usize = idx
                .parse()
                .map_err(|_| DlrError::config(format!("Invalid OpenCL index: {}", idx)))?;
            Ok(Self::Opencl(index))
        } else {
            Err(DlrError::config(format!("Invalid device: {}", s)))
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(idx) => write!(f, "cuda:{}", idx),
            Self::Opencl(idx) => write!(f, "opencl:{}", idx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda(0));
        assert_eq!(" CUDA:1 ".parse::<Device>().unwrap(), Device::Cuda(1));
        assert_eq!("opencl:2".parse::<Device>().unwrap(), Device::Opencl(2));
        assert!(matches!(
            "tpu".parse::<Device>(),
            Err(DlrError::Config(_))
        ));
        assert!(matches!(
            "cuda:x".parse::<Device>(),
            Err(DlrError::Config(_))
        ));

        assert_eq!(Device::Cuda(1).to_string(), "cuda:1");
        assert_eq!(Device::cpu().to_string(), "cpu");
    }

    #[test]
    fn test_native_codes() {
        assert_eq!(Device::Cpu.type_code(), 1);
        assert_eq!(Device::Cuda(3).type_code(), 2);
        assert_eq!(Device::Cuda(3).ordinal(), 3);
        assert_eq!(Device::Cpu.ordinal(), 0);
    }
}
