//! LZMA entries.
//!
//! The `zip` writer reads LZMA (method 14) but cannot produce it. An LZMA
//! entry is therefore compressed here, framed as a one-entry archive in
//! memory and moved into the real archive with a raw copy, which keeps the
//! compressed bytes as they are. With a password the compressed stream is
//! sealed with WinZip AES-256 (AE-2) before framing.
//!
//! Entries are buffered whole, so their size is limited to 4 GiB.

use std::io::{Cursor, Read, Seek, Write};

use ::zip::{DateTime, ZipArchive, ZipWriter};
use aes::Aes256;
use anyhow::{Context, Result, anyhow, bail};
use byteorder::{LittleEndian, WriteBytesExt};
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use lzma_rust2::{LzmaOptions, LzmaWriter};
use sha1::Sha1;

/// ZIP compression method numbers
const METHOD_LZMA: u16 = 14;
const METHOD_AES: u16 = 99;

/// LZMA needs a 6.3 reader; made by Unix so the mode bits are honored
const VERSION_NEEDED: u16 = 63;
const VERSION_MADE_BY: u16 = (3 << 8) | VERSION_NEEDED;

const FLAG_ENCRYPTED: u16 = 0x0001;
const FLAG_LZMA_EOS: u16 = 0x0002;
const FLAG_UTF8: u16 = 0x0800;

/// 1980-01-01 00:00 in DOS format. The real time is set by the copy.
const DOS_TIME: u16 = 0;
const DOS_DATE: u16 = (1 << 5) | 1;

/// LZMA SDK version recorded in front of the properties
const LZMA_SDK_VERSION: [u8; 2] = [9, 20];
const LZMA_PROPS_SIZE: u16 = 5;
const LZMA_PRESET: u32 = 6;

/// WinZip AES parameters for 256-bit keys
const AES_VENDOR_VERSION: u16 = 2;
const AES_VENDOR_ID: &[u8; 2] = b"AE";
const AES_STRENGTH: u8 = 3;
const AES_EXTRA_ID: u16 = 0x9901;
const AES_EXTRA_SIZE: u16 = 7;
const AES_SALT_LEN: usize = 16;
const AES_KEY_LEN: usize = 32;
const AES_VERIFIER_LEN: usize = 2;
const AES_AUTH_CODE_LEN: usize = 10;
const AES_KEY_ROUNDS: u32 = 1000;

type Aes256Ctr = ctr::Ctr128LE<Aes256>;

/// Compress `source` with LZMA and append it to `zip` as `name`.
///
/// An empty `password` leaves the entry unencrypted.
pub(crate) fn add_entry<W, R>(
    zip: &mut ZipWriter<W>,
    name: &str,
    source: &mut R,
    mode: u32,
    password: &str,
) -> Result<()>
where
    W: Write + Seek,
    R: Read,
{
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    let size = u32::try_from(data.len())
        .map_err(|_| anyhow!("{name} is too large for an LZMA entry"))?;
    let crc32 = crc32fast::hash(&data);

    let mut payload = compress(&data)?;
    drop(data);

    let mut header = EntryHeader {
        flags: FLAG_LZMA_EOS | FLAG_UTF8,
        method: METHOD_LZMA,
        crc32,
        compressed_size: 0,
        uncompressed_size: size,
        name,
        extra: Vec::new(),
        mode,
    };
    if !password.is_empty() {
        payload = seal(payload, password)?;
        header.flags |= FLAG_ENCRYPTED;
        header.method = METHOD_AES;
        // AE-2 drops the checksum in favor of the authentication code
        header.crc32 = 0;
        header.extra = aes_extra_field();
    }
    header.compressed_size = u32::try_from(payload.len())
        .map_err(|_| anyhow!("{name} is too large for an LZMA entry"))?;

    let framed = frame(&header, &payload)?;
    let mut scratch = ZipArchive::new(Cursor::new(framed)).context("Failed to frame LZMA entry")?;
    let entry = scratch.by_index_raw(0)?;
    zip.raw_copy_file_touch(entry, DateTime::default_for_write(), Some(mode))?;
    Ok(())
}

/// LZMA stream in ZIP layout: SDK version, properties size, properties,
/// then the raw stream closed with an end marker.
fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let options = LzmaOptions::with_preset(LZMA_PRESET);

    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    out.extend_from_slice(&LZMA_SDK_VERSION);
    out.write_u16::<LittleEndian>(LZMA_PROPS_SIZE)?;
    out.write_u8(options.get_props())?;
    out.write_u32::<LittleEndian>(options.dict_size)?;

    let mut writer = LzmaWriter::new_no_header(out, &options, true)?;
    writer.write_all(data)?;
    Ok(writer.finish()?)
}

/// Encrypt `payload` in place and wrap it as salt, password verifier,
/// ciphertext and authentication code.
fn seal(mut payload: Vec<u8>, password: &str) -> Result<Vec<u8>> {
    let mut salt = [0u8; AES_SALT_LEN];
    getrandom::getrandom(&mut salt).map_err(|err| anyhow!("Failed to generate salt: {err}"))?;

    let mut keys = [0u8; 2 * AES_KEY_LEN + AES_VERIFIER_LEN];
    pbkdf2::pbkdf2_hmac::<Sha1>(password.as_bytes(), &salt, AES_KEY_ROUNDS, &mut keys);
    let (cipher_key, rest) = keys.split_at(AES_KEY_LEN);
    let (auth_key, verifier) = rest.split_at(AES_KEY_LEN);

    // Little-endian block counter starting at one
    let mut counter = [0u8; 16];
    counter[0] = 1;
    let mut cipher = Aes256Ctr::new_from_slices(cipher_key, &counter)
        .map_err(|err| anyhow!("Invalid AES key: {err}"))?;
    cipher.apply_keystream(&mut payload);

    let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(auth_key)
        .map_err(|err| anyhow!("Invalid AES key: {err}"))?;
    mac.update(&payload);
    let code = mac.finalize().into_bytes();

    let mut sealed =
        Vec::with_capacity(AES_SALT_LEN + AES_VERIFIER_LEN + payload.len() + AES_AUTH_CODE_LEN);
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(verifier);
    sealed.extend_from_slice(&payload);
    sealed.extend_from_slice(&code[..AES_AUTH_CODE_LEN]);
    Ok(sealed)
}

fn aes_extra_field() -> Vec<u8> {
    let mut extra = Vec::with_capacity(4 + AES_EXTRA_SIZE as usize);
    extra.extend_from_slice(&AES_EXTRA_ID.to_le_bytes());
    extra.extend_from_slice(&AES_EXTRA_SIZE.to_le_bytes());
    extra.extend_from_slice(&AES_VENDOR_VERSION.to_le_bytes());
    extra.extend_from_slice(AES_VENDOR_ID);
    extra.push(AES_STRENGTH);
    extra.extend_from_slice(&METHOD_LZMA.to_le_bytes());
    extra
}

/// Fields shared by the local and central headers of the single entry.
struct EntryHeader<'a> {
    flags: u16,
    method: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    name: &'a str,
    extra: Vec<u8>,
    mode: u32,
}

impl EntryHeader<'_> {
    const LOCAL_SIGNATURE: &'static [u8] = b"PK\x03\x04";
    const CENTRAL_SIGNATURE: &'static [u8] = b"PK\x01\x02";

    fn write_common<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.method)?;
        out.write_u16::<LittleEndian>(DOS_TIME)?;
        out.write_u16::<LittleEndian>(DOS_DATE)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        out.write_u16::<LittleEndian>(field_len(self.name.len())?)?;
        out.write_u16::<LittleEndian>(field_len(self.extra.len())?)?;
        Ok(())
    }

    fn write_local<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(Self::LOCAL_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        self.write_common(out)?;
        out.write_all(self.name.as_bytes())?;
        out.write_all(&self.extra)?;
        Ok(())
    }

    fn write_central<W: Write>(&self, out: &mut W, local_offset: u32) -> Result<()> {
        out.write_all(Self::CENTRAL_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        self.write_common(out)?;
        out.write_u16::<LittleEndian>(0)?; // comment length
        out.write_u16::<LittleEndian>(0)?; // disk number
        out.write_u16::<LittleEndian>(0)?; // internal attributes
        out.write_u32::<LittleEndian>(self.mode << 16)?;
        out.write_u32::<LittleEndian>(local_offset)?;
        out.write_all(self.name.as_bytes())?;
        out.write_all(&self.extra)?;
        Ok(())
    }
}

/// End of Central Directory for a one-entry archive
struct EndOfCentralDirectory {
    cd_size: u32,
    cd_offset: u32,
}

impl EndOfCentralDirectory {
    const SIGNATURE: &'static [u8] = b"PK\x05\x06";

    fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(0)?; // this disk
        out.write_u16::<LittleEndian>(0)?; // disk with central directory
        out.write_u16::<LittleEndian>(1)?; // entries on this disk
        out.write_u16::<LittleEndian>(1)?; // total entries
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(0)?; // comment length
        Ok(())
    }
}

fn frame(header: &EntryHeader<'_>, payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    header.write_local(&mut out)?;
    out.write_all(payload)?;

    let cd_offset = offset(out.len())?;
    header.write_central(&mut out, 0)?;
    let cd_size = offset(out.len())? - cd_offset;

    EndOfCentralDirectory { cd_size, cd_offset }.write_to(&mut out)?;
    Ok(out)
}

fn field_len(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| anyhow!("Header field too long: {len} bytes"))
}

fn offset(len: usize) -> Result<u32> {
    match u32::try_from(len) {
        Ok(offset) => Ok(offset),
        Err(_) => bail!("LZMA entry exceeds 4 GiB"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::zip::CompressionMethod;

    fn round_trip(password: &str) -> (CompressionMethod, bool) {
        let contents = b"lzma lzma lzma lzma lzma lzma lzma lzma".repeat(64);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        add_entry(&mut zip, "dir/data.txt", &mut contents.as_slice(), 0o640, password).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = if password.is_empty() {
            archive.by_index(0).unwrap()
        } else {
            archive.by_index_decrypt(0, password.as_bytes()).unwrap()
        };
        assert_eq!(entry.name(), "dir/data.txt");
        assert_eq!(entry.size(), contents.len() as u64);
        assert_eq!(entry.unix_mode().map(|m| m & 0o777), Some(0o640));

        let mut out = Vec::new();
        entry.read_to_end(&mut out).unwrap();
        assert_eq!(out, contents);
        (entry.compression(), entry.encrypted())
    }

    #[test]
    fn test_plain_lzma_entry() {
        let (method, encrypted) = round_trip("");
        assert_eq!(method, CompressionMethod::Lzma);
        assert!(!encrypted);
    }

    #[test]
    fn test_encrypted_lzma_entry() {
        let (method, encrypted) = round_trip("s3cret");
        assert_eq!(method, CompressionMethod::Lzma);
        assert!(encrypted);
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        add_entry(&mut zip, "a.txt", &mut b"alpha".as_slice(), 0o644, "right").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            archive.by_index_decrypt(0, b"wrong"),
            Err(::zip::result::ZipError::InvalidPassword)
        ));
    }

    #[test]
    fn test_compressed_stream_header() {
        let stream = compress(b"hello").unwrap();
        assert_eq!(&stream[..2], &LZMA_SDK_VERSION);
        assert_eq!(&stream[2..4], &LZMA_PROPS_SIZE.to_le_bytes());
        assert_eq!(stream[4], LzmaOptions::with_preset(LZMA_PRESET).get_props());
    }
}
