//! Sticker pack metadata for WebP stickers.
//!
//! WhatsApp reads the pack name and publisher from a JSON document stored in
//! the EXIF chunk of an extended (`VP8X`) WebP file.

use zayden_core::{error::ZaydenError, traits::StickerPack};

const RIFF: &[u8; 4] = b"RIFF";
const WEBP: &[u8; 4] = b"WEBP";
const VP8X: [u8; 4] = *b"VP8X";
const VP8: [u8; 4] = *b"VP8 ";
const VP8L: [u8; 4] = *b"VP8L";
const EXIF: [u8; 4] = *b"EXIF";
const XMP: [u8; 4] = *b"XMP ";

const FLAG_ALPHA: u8 = 0x10;
const FLAG_EXIF: u8 = 0x08;

/// Little-endian TIFF header with one IFD entry (tag 0x5741, type UNDEFINED)
/// whose value starts at offset 22. Bytes 14..18 hold the JSON length.
const EXIF_HEADER: [u8; 22] = [
    0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x41, 0x57, 0x07, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x16, 0x00, 0x00, 0x00,
];

#[derive(Debug, Clone)]
struct Chunk {
    fourcc: [u8; 4],
    data: Vec<u8>,
}

/// Build the EXIF payload for `pack`.
pub fn sticker_exif(pack: &StickerPack) -> Vec<u8> {
    let json = serde_json::json!({
        "sticker-pack-id": uuid::Uuid::new_v4().to_string(),
        "sticker-pack-name": pack.name,
        "sticker-pack-publisher": pack.publisher,
        "emojis": [""],
    })
    .to_string();
    let json = json.as_bytes();

    let mut exif = EXIF_HEADER.to_vec();
    exif[14..18].copy_from_slice(&(json.len() as u32).to_le_bytes());
    exif.extend_from_slice(json);
    exif
}

/// Return `webp` with `exif` stored as its EXIF chunk.
///
/// Simple (`VP8 `/`VP8L`) files are promoted to the extended format; an
/// existing EXIF chunk is replaced.
pub fn embed_exif(webp: &[u8], exif: &[u8]) -> Result<Vec<u8>, ZaydenError> {
    let mut chunks = parse_chunks(webp)?;

    if chunks.first().map(|c| c.fourcc) != Some(VP8X) {
        let image = chunks
            .iter()
            .find(|c| c.fourcc == VP8 || c.fourcc == VP8L)
            .ok_or_else(|| ZaydenError::Media("webp has no image chunk".into()))?;
        let (width, height, alpha) = dimensions(image)?;
        let mut header = vec![0u8; 10];
        if alpha {
            header[0] |= FLAG_ALPHA;
        }
        header[4..7].copy_from_slice(&u24(width - 1));
        header[7..10].copy_from_slice(&u24(height - 1));
        chunks.insert(
            0,
            Chunk {
                fourcc: VP8X,
                data: header,
            },
        );
    }

    if let Some(header) = chunks.first_mut() {
        if header.data.is_empty() {
            return Err(ZaydenError::Media("empty VP8X chunk".into()));
        }
        header.data[0] |= FLAG_EXIF;
    }

    chunks.retain(|c| c.fourcc != EXIF);
    let exif_chunk = Chunk {
        fourcc: EXIF,
        data: exif.to_vec(),
    };
    match chunks.iter().position(|c| c.fourcc == XMP) {
        Some(pos) => chunks.insert(pos, exif_chunk),
        None => chunks.push(exif_chunk),
    }

    Ok(write_chunks(&chunks))
}

fn parse_chunks(webp: &[u8]) -> Result<Vec<Chunk>, ZaydenError> {
    if webp.len() < 12 || &webp[0..4] != RIFF || &webp[8..12] != WEBP {
        return Err(ZaydenError::Media("not a RIFF/WEBP file".into()));
    }
    let mut chunks = Vec::new();
    let mut pos = 12;
    while pos + 8 <= webp.len() {
        let mut fourcc = [0u8; 4];
        fourcc.copy_from_slice(&webp[pos..pos + 4]);
        let size = u32::from_le_bytes([
            webp[pos + 4],
            webp[pos + 5],
            webp[pos + 6],
            webp[pos + 7],
        ]) as usize;
        let start = pos + 8;
        let end = start
            .checked_add(size)
            .filter(|end| *end <= webp.len())
            .ok_or_else(|| ZaydenError::Media("truncated webp chunk".into()))?;
        chunks.push(Chunk {
            fourcc,
            data: webp[start..end].to_vec(),
        });
        pos = end + (size & 1);
    }
    Ok(chunks)
}

fn write_chunks(chunks: &[Chunk]) -> Vec<u8> {
    let mut body = WEBP.to_vec();
    for chunk in chunks {
        body.extend_from_slice(&chunk.fourcc);
        body.extend_from_slice(&(chunk.data.len() as u32).to_le_bytes());
        body.extend_from_slice(&chunk.data);
        if chunk.data.len() % 2 == 1 {
            body.push(0);
        }
    }
    let mut out = RIFF.to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

/// Width, height and alpha of a simple-format image chunk.
fn dimensions(chunk: &Chunk) -> Result<(u32, u32, bool), ZaydenError> {
    let d = &chunk.data;
    if chunk.fourcc == VP8L {
        if d.len() < 5 || d[0] != 0x2f {
            return Err(ZaydenError::Media("bad VP8L header".into()));
        }
        let bits = u32::from_le_bytes([d[1], d[2], d[3], d[4]]);
        let width = (bits & 0x3fff) + 1;
        let height = ((bits >> 14) & 0x3fff) + 1;
        let alpha = (bits >> 28) & 1 == 1;
        Ok((width, height, alpha))
    } else {
        if d.len() < 10 || d[3..6] != [0x9d, 0x01, 0x2a] {
            return Err(ZaydenError::Media("bad VP8 header".into()));
        }
        let width = u32::from(u16::from_le_bytes([d[6], d[7]]) & 0x3fff);
        let height = u32::from(u16::from_le_bytes([d[8], d[9]]) & 0x3fff);
        if width == 0 || height == 0 {
            return Err(ZaydenError::Media("zero-sized VP8 frame".into()));
        }
        Ok((width, height, false))
    }
}

fn u24(v: u32) -> [u8; 3] {
    let b = v.to_le_bytes();
    [b[0], b[1], b[2]]
}
