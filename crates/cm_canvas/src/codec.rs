use tiny_skia::{IntSize, Pixmap};

use crate::{CanvasError, DataUrl};

/// 快照输出格式
pub const PNG_MIME: &str = "image/png";

/// 将任意格式的图像字节解码为（预乘 alpha 的）Pixmap
pub fn decode_pixmap(bytes: &[u8]) -> Result<Pixmap, CanvasError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply(&mut data);

    let size =
        IntSize::from_wh(width, height).ok_or(CanvasError::InvalidSize { width, height })?;
    Pixmap::from_vec(data, size).ok_or(CanvasError::InvalidSize { width, height })
}

/// 解码内联 data URL
pub fn decode_data_url(url: &DataUrl) -> Result<Pixmap, CanvasError> {
    decode_pixmap(&url.decode()?)
}

/// 将 Pixmap 编码为 PNG 字节
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, CanvasError> {
    pixmap
        .encode_png()
        .map_err(|e| CanvasError::Encode(e.to_string()))
}

/// 将 Pixmap 展平为 PNG data URL
pub fn to_data_url(pixmap: &Pixmap) -> Result<DataUrl, CanvasError> {
    Ok(DataUrl::from_bytes(PNG_MIME, &encode_png(pixmap)?))
}

/// RGBA8 -> 预乘 RGBA8（tiny_skia 原生格式）
fn premultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}
