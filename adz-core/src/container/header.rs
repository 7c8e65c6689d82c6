use crate::error::{AdzError, Result};
use std::io::{self, Read, Write};

pub const SIGNATURE: u32 = 0xADAD_ADAD;
pub const HEADER_LEN: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub signature: u32,
    /// Number of records in the metadata table
    pub entry_count: u32,
    /// Absolute file offset where the metadata table starts (content region end)
    pub metadata_offset: u32,
}

impl Header {
    pub fn new(entry_count: u32, metadata_offset: u32) -> Self {
        Self {
            signature: SIGNATURE,
            entry_count,
            metadata_offset,
        }
    }

    /// All-zero header written before the content region; it fails the
    /// signature check until the writer finalizes it.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn write_to(&self, mut w: impl Write) -> io::Result<()> {
        w.write_all(&self.signature.to_le_bytes())?;
        w.write_all(&self.entry_count.to_le_bytes())?;
        w.write_all(&self.metadata_offset.to_le_bytes())?;
        Ok(())
    }

    /// Reads and validates the signature before touching anything else.
    pub fn read_from(mut r: impl Read) -> Result<Self> {
        let signature = read_u32(&mut r).map_err(|e| truncated(e, "signature"))?;
        if signature != SIGNATURE {
            return Err(AdzError::InvalidFormat(format!(
                "bad signature {signature:#010x}"
            )));
        }
        let entry_count = read_u32(&mut r).map_err(|e| truncated(e, "entry count"))?;
        let metadata_offset = read_u32(&mut r).map_err(|e| truncated(e, "metadata offset"))?;
        Ok(Self {
            signature,
            entry_count,
            metadata_offset,
        })
    }
}

fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn truncated(e: io::Error, field: &str) -> AdzError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        AdzError::InvalidFormat(format!("file too small for header ({field})"))
    } else {
        AdzError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_little_endian() {
        let mut buf = Vec::new();
        Header::new(3, 0x0102_0304).write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, HEADER_LEN);
        assert_eq!(&buf[..4], &[0xAD, 0xAD, 0xAD, 0xAD]);
        assert_eq!(&buf[4..8], &[3, 0, 0, 0]);
        assert_eq!(&buf[8..12], &[4, 3, 2, 1]);

        let h = Header::read_from(&buf[..]).unwrap();
        assert_eq!(h.entry_count, 3);
        assert_eq!(h.metadata_offset, 0x0102_0304);
    }

    #[test]
    fn placeholder_fails_signature_check() {
        let mut buf = Vec::new();
        Header::placeholder().write_to(&mut buf).unwrap();
        assert!(matches!(
            Header::read_from(&buf[..]),
            Err(AdzError::InvalidFormat(_))
        ));
    }

    #[test]
    fn short_input_is_invalid_format() {
        assert!(matches!(
            Header::read_from(&[0xADu8, 0xAD][..]),
            Err(AdzError::InvalidFormat(_))
        ));
        let mut buf = SIGNATURE.to_le_bytes().to_vec();
        buf.extend_from_slice(&[1, 0]);
        assert!(matches!(
            Header::read_from(&buf[..]),
            Err(AdzError::InvalidFormat(_))
        ));
    }
}
