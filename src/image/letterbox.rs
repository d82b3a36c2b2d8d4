use crate::image::DecodedImage;
use crate::utils::error::FoodError;
use crate::Result;
use image::{
    imageops::{self, FilterType},
    Rgb, RgbImage,
};
use ndarray::Array4;

/// YOLO 导出模型约定的填充灰度值
const PAD_VALUE: u8 = 114;

/// 等比缩放到正方形输入并居中填充（letterbox）
pub struct Letterbox {
    size: u32,
}

impl Letterbox {
    pub fn new(size: usize) -> Self {
        Self { size: size as u32 }
    }

    /// 生成模型输入张量：NCHW，归一化到 [0, 1]
    ///
    /// 缩放在 u8 缓冲上完成，只有 `size x size` 的画布会转成 f32。
    pub fn to_tensor(&self, image: &DecodedImage) -> Result<Array4<f32>> {
        let canvas = self.letterbox(image.rgb())?;
        let size = self.size as usize;

        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                tensor[[0, c, y, x]] = pixel[c] as f32 / 255.0;
            }
        }

        Ok(tensor)
    }

    /// 保持宽高比缩放后贴到灰色画布中央
    fn letterbox(&self, rgb: &RgbImage) -> Result<RgbImage> {
        let (orig_w, orig_h) = rgb.dimensions();
        if orig_w == 0 || orig_h == 0 {
            return Err(FoodError::Decode(format!(
                "cannot letterbox image of size {orig_w}x{orig_h}"
            )));
        }

        let target = self.size;
        let scale = (target as f32 / orig_w as f32).min(target as f32 / orig_h as f32);

        let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target);
        let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target);

        let resized = imageops::resize(rgb, new_w, new_h, FilterType::Triangle);

        let mut canvas = RgbImage::from_pixel(target, target, Rgb([PAD_VALUE; 3]));
        let offset_x = (target - new_w) / 2;
        let offset_y = (target - new_h) / 2;
        imageops::overlay(&mut canvas, &resized, offset_x as i64, offset_y as i64);

        Ok(canvas)
    }
}
