use crate::utils::util::Result;

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum SvType {
    DELETION,
    INSERTION,
}

impl SvType {
    pub fn from_u8(bytes: &[u8]) -> Result<Self> {
        match bytes {
            b"DEL" => Ok(SvType::DELETION),
            b"INS" => Ok(SvType::INSERTION),
            _ => Err(crate::svm_error!(
                "Invalid SV type: {:?}",
                String::from_utf8_lossy(bytes)
            )),
        }
    }
}

impl std::str::FromStr for SvType {
    type Err = crate::error::SvmError;
    fn from_str(s: &str) -> Result<Self> {
        Self::from_u8(s.as_bytes())
    }
}

impl std::fmt::Display for SvType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SvType::DELETION => write!(f, "DEL"),
            SvType::INSERTION => write!(f, "INS"),
        }
    }
}
