//! PNG encoding for RGBA rasters.
//!
//! Two encodings are produced:
//! - **Indexed (color type 3)** when the raster has at most 256 distinct
//!   colors, which is the common case for a colour ramp with a transparent
//!   no-data colour.
//! - **RGBA (color type 6)** otherwise.
//!
//! Optional `tEXt` chunks carry plain metadata such as the map title.

use std::collections::HashMap;
use std::io::Write;

use rayon::prelude::*;
use wx_common::{WxError, WxResult};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG.
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixel count for parallel palette extraction.
const PARALLEL_THRESHOLD: usize = 4096;

type Rgba = (u8, u8, u8, u8);

/// Encode an RGBA raster, picking indexed encoding when the colors fit.
///
/// `text` entries become `tEXt` chunks (`keyword`, `value`).
pub fn encode_png(
    pixels: &[u8],
    width: usize,
    height: usize,
    text: &[(&str, &str)],
) -> WxResult<Vec<u8>> {
    check_dimensions(pixels, width, height)?;

    let palette = if pixels.len() / 4 >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match palette {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices, text),
        None => encode_rgba(pixels, width, height, text),
    }
}

/// Encode an RGBA raster as color type 6.
pub fn encode_rgba(
    pixels: &[u8],
    width: usize,
    height: usize,
    text: &[(&str, &str)],
) -> WxResult<Vec<u8>> {
    check_dimensions(pixels, width, height)?;

    let mut png = start(width, height, 6);
    write_text(&mut png, text);
    let idat = deflate_scanlines(pixels, width * 4, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode palette indices as color type 3.
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[Rgba],
    indices: &[u8],
    text: &[(&str, &str)],
) -> WxResult<Vec<u8>> {
    if indices.len() != width * height {
        return Err(WxError::Render(format!(
            "{} palette indices for a {}x{} image",
            indices.len(),
            width,
            height
        )));
    }
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(WxError::Render(format!("palette has {} entries", palette.len())));
    }

    let mut png = start(width, height, 3);

    let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|&(_, _, _, a)| a < 255) {
        let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_text(&mut png, text);
    let idat = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_dimensions(pixels: &[u8], width: usize, height: usize) -> WxResult<()> {
    if width == 0 || height == 0 {
        return Err(WxError::Render(format!("empty image {}x{}", width, height)));
    }
    if pixels.len() != width * height * 4 {
        return Err(WxError::Render(format!(
            "{} bytes of RGBA data for a {}x{} image",
            pixels.len(),
            width,
            height
        )));
    }
    Ok(())
}

/// Signature plus IHDR for an 8-bit image of the given color type.
fn start(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut png = SIGNATURE.to_vec();

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(color_type);
    ihdr.push(0); // compression
    ihdr.push(0); // filter
    ihdr.push(0); // interlace
    write_chunk(&mut png, b"IHDR", &ihdr);

    png
}

fn write_text(png: &mut Vec<u8>, text: &[(&str, &str)]) {
    for (keyword, value) in text {
        // Keywords are 1-79 Latin-1 bytes; non-ASCII text is dropped.
        let keyword: String = keyword.chars().filter(char::is_ascii).take(79).collect();
        if keyword.is_empty() {
            continue;
        }
        let mut data = keyword.into_bytes();
        data.push(0);
        data.extend(value.chars().filter(char::is_ascii).map(|c| c as u8));
        write_chunk(png, b"tEXt", &data);
    }
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix every scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> WxResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (row_bytes + 1));
    for row in data.chunks_exact(row_bytes).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

#[inline(always)]
fn pack(p: &[u8]) -> u32 {
    u32::from_le_bytes([p[0], p[1], p[2], p[3]])
}

#[inline(always)]
fn unpack(packed: u32) -> Rgba {
    let [r, g, b, a] = packed.to_le_bytes();
    (r, g, b, a)
}

fn extract_palette_sequential(pixels: &[u8]) -> Option<(Vec<Rgba>, Vec<u8>)> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let packed = pack(px);
        let index = match lookup.get(&packed) {
            Some(&i) => i,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push(unpack(packed));
                lookup.insert(packed, i);
                i
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Collect distinct colors per chunk in parallel, merge them in chunk order,
/// then map pixels to indices in parallel.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Vec<Rgba>, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    let per_chunk: Vec<Vec<u32>> = pixels
        .par_chunks(chunk_pixels * 4)
        .map(|chunk| {
            let mut seen: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            let mut order = Vec::new();
            for px in chunk.chunks_exact(4) {
                let packed = pack(px);
                if seen.insert(packed, ()).is_none() {
                    order.push(packed);
                    if order.len() > MAX_PALETTE_SIZE {
                        break;
                    }
                }
            }
            order
        })
        .collect();

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    for packed in per_chunk.into_iter().flatten() {
        if lookup.contains_key(&packed) {
            continue;
        }
        if palette.len() >= MAX_PALETTE_SIZE {
            return None;
        }
        lookup.insert(packed, palette.len() as u8);
        palette.push(unpack(packed));
    }

    let indices = pixels
        .par_chunks_exact(4)
        .map(|px| lookup.get(&pack(px)).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}
