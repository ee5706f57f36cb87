use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};
use thiserror::Error;

/// 魔数常量 - 预计算页面包 (Facet Compiled PaGeS)
pub const MAGIC_BYTES: &[u8] = b"FCPGS";

/// 头部长度：魔数 + 2字节版本 + 4字节原始大小
const HEADER_LEN: usize = MAGIC_BYTES.len() + 2 + 4;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("数据太短，无法解析: {0} 字节")]
    TooShort(usize),
    #[error("无效的文件格式：魔数不匹配")]
    BadMagic,
    #[error("不支持的版本: {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("数据过大，无法写入头部: {0} 字节")]
    TooLarge(usize),
    #[error("解压后数据大小不匹配: 期望 {expected} 字节, 实际 {actual} 字节")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("序列化失败: {0}")]
    Encode(String),
    #[error("反序列化失败: {0}")]
    Decode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 已校验的头部
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: [u8; 2],
    pub original_size: usize,
}

/// 将对象序列化为二进制格式
pub fn to_binary<T: serde::Serialize>(obj: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serde::encode_to_vec(obj, bincode::config::standard())
        .map_err(|e| CodecError::Encode(e.to_string()))
}

/// 从二进制格式反序列化对象
pub fn from_binary<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    bincode::serde::decode_from_slice(data, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| CodecError::Decode(e.to_string()))
}

/// 序列化并压缩：魔数 | 版本 | 原始大小(LE u32) | gzip(bincode)
pub fn to_compressed<T: serde::Serialize>(obj: &T, version: [u8; 2]) -> Result<Vec<u8>, CodecError> {
    let binary = to_binary(obj)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&binary)?;
    let compressed = encoder.finish()?;

    let mut output = Vec::with_capacity(HEADER_LEN + compressed.len());
    output.extend_from_slice(MAGIC_BYTES);
    output.extend_from_slice(&version);
    output.extend_from_slice(&size_field(binary.len())?);
    output.extend_from_slice(&compressed);
    Ok(output)
}

/// 头部的原始大小字段，超出 u32 时报错
fn size_field(len: usize) -> Result<[u8; 4], CodecError> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| CodecError::TooLarge(len))
}

/// 校验头部并返回版本与原始大小
pub fn read_header(data: &[u8], max_version: u8) -> Result<Header, CodecError> {
    if data.len() < HEADER_LEN {
        return Err(CodecError::TooShort(data.len()));
    }
    if &data[..MAGIC_BYTES.len()] != MAGIC_BYTES {
        return Err(CodecError::BadMagic);
    }

    let offset = MAGIC_BYTES.len();
    let version = [data[offset], data[offset + 1]];
    if version[0] > max_version {
        return Err(CodecError::UnsupportedVersion(version[0], version[1]));
    }

    let mut size_bytes = [0u8; 4];
    size_bytes.copy_from_slice(&data[offset + 2..HEADER_LEN]);

    Ok(Header {
        version,
        original_size: u32::from_le_bytes(size_bytes) as usize,
    })
}

/// 解压并反序列化，允许指定支持的最大主版本
pub fn from_compressed<T: serde::de::DeserializeOwned>(data: &[u8], max_version: u8) -> Result<T, CodecError> {
    let header = read_header(data, max_version)?;

    let mut decoder = GzDecoder::new(&data[HEADER_LEN..]);
    let mut decompressed = Vec::with_capacity(header.original_size);
    decoder.read_to_end(&mut decompressed)?;

    if decompressed.len() != header.original_size {
        return Err(CodecError::SizeMismatch {
            expected: header.original_size,
            actual: decompressed.len(),
        });
    }

    from_binary(&decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_version_and_size() {
        let data = to_compressed(&vec!["AI".to_string(), "DX".to_string()], [1, 2]).unwrap();
        let header = read_header(&data, 1).unwrap();
        assert_eq!(header.version, [1, 2]);
        assert_eq!(header.original_size, to_binary(&vec!["AI", "DX"]).unwrap().len());

        let back: Vec<String> = from_compressed(&data, 1).unwrap();
        assert_eq!(back, ["AI", "DX"]);
    }

    #[test]
    fn rejects_newer_version() {
        let data = to_compressed(&1u32, [2, 0]).unwrap();
        assert!(matches!(
            from_compressed::<u32>(&data, 1),
            Err(CodecError::UnsupportedVersion(2, 0))
        ));
    }

    #[test]
    fn rejects_bad_magic_and_short_input() {
        assert!(matches!(read_header(b"FCP", 1), Err(CodecError::TooShort(3))));
        let mut data = to_compressed(&1u32, [1, 0]).unwrap();
        data[0] = b'X';
        assert!(matches!(read_header(&data, 1), Err(CodecError::BadMagic)));
    }

    #[test]
    fn size_field_rejects_lengths_beyond_u32() {
        assert_eq!(size_field(300).unwrap(), 300u32.to_le_bytes());
        assert_eq!(size_field(u32::MAX as usize).unwrap(), u32::MAX.to_le_bytes());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn size_field_overflow_is_an_error() {
        let len = u32::MAX as usize + 1;
        assert!(matches!(size_field(len), Err(CodecError::TooLarge(n)) if n == len));
    }
}
