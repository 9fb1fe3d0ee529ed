use std::io::{Read, Write};

pub const MAGIC: &[u8; 6] = b"LORTIM"; // timing matrix marker
pub const VERSION: u16 = 1;
pub const HEADER_LEN: u64 = 6 + 2 + 8 + 8 + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub version: u16,
    pub rows: u64,
    /// Bits per row
    pub width: u64,
    /// Byte length of the manifest (CBOR)
    pub manifest_len: u64,
}

impl Superblock {
    pub fn write_to(&self, mut w: impl Write) -> std::io::Result<()> {
        w.write_all(MAGIC)?;
        w.write_all(&self.version.to_le_bytes())?;
        w.write_all(&self.rows.to_le_bytes())?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.manifest_len.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from(mut r: impl Read) -> std::io::Result<Self> {
        let mut magic = [0u8; 6];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(std::io::ErrorKind::InvalidData.into());
        }
        let mut v = [0u8; 2];
        r.read_exact(&mut v)?;
        let version = u16::from_le_bytes(v);
        let mut word = [0u8; 8];
        r.read_exact(&mut word)?;
        let rows = u64::from_le_bytes(word);
        r.read_exact(&mut word)?;
        let width = u64::from_le_bytes(word);
        r.read_exact(&mut word)?;
        let manifest_len = u64::from_le_bytes(word);
        Ok(Self {
            version,
            rows,
            width,
            manifest_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_len_matches_encoding() {
        let sb = Superblock {
            version: VERSION,
            rows: 3,
            width: 49_212,
            manifest_len: 77,
        };
        let mut buf = Vec::new();
        sb.write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, HEADER_LEN);
        assert_eq!(Superblock::read_from(&buf[..]).unwrap(), sb);
    }

    #[test]
    fn bad_magic_is_invalid_data() {
        let err = Superblock::read_from(&b"GIF89a\x01\x00"[..]).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
