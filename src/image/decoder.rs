use crate::utils::error::FoodError;
use crate::Result;
use image::{GenericImageView, ImageFormat, RgbImage};
use ndarray::ArrayView3;

/// 解码后的图像：RGB 通道顺序、取值 0~255，以 u8 保存原始分辨率
#[derive(Debug, Clone)]
pub struct DecodedImage {
    rgb: RgbImage,
}

impl DecodedImage {
    pub fn new(rgb: RgbImage) -> Self {
        Self { rgb }
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// 像素矩阵视图，HWC 布局，不拷贝
    pub fn pixels(&self) -> Result<ArrayView3<'_, u8>> {
        let (width, height) = self.rgb.dimensions();
        ArrayView3::from_shape((height as usize, width as usize, 3), self.rgb.as_raw())
            .map_err(|e| FoodError::Decode(format!("pixel buffer does not match {width}x{height}x3: {e}")))
    }

    /// (height, width)
    pub fn dimensions(&self) -> (usize, usize) {
        let (width, height) = self.rgb.dimensions();
        (height as usize, width as usize)
    }

    pub fn channels(&self) -> usize {
        3
    }
}

pub struct ImageDecoder {
    max_bytes: usize,
}

impl ImageDecoder {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// 校验声明的内容类型，必须以 `image/` 开头
    pub fn validate_content_type(content_type: &str) -> Result<()> {
        let normalized = content_type.trim_start().to_ascii_lowercase();
        if normalized.starts_with("image/") {
            Ok(())
        } else {
            Err(FoodError::InvalidContentType(content_type.to_string()))
        }
    }

    /// 先校验内容类型，再解码字节
    pub fn decode(&self, bytes: &[u8], content_type: &str) -> Result<DecodedImage> {
        Self::validate_content_type(content_type)?;
        self.decode_bytes(bytes)
    }

    /// 解码字节为像素矩阵；要么完整成功，要么返回错误
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodedImage> {
        if bytes.is_empty() {
            return Err(FoodError::Decode("empty image data".to_string()));
        }

        if bytes.len() > self.max_bytes {
            return Err(FoodError::FileTooLarge(bytes.len(), self.max_bytes));
        }

        if let Some(format) = Self::detect_format(bytes) {
            if !Self::is_supported_format(format) {
                return Err(FoodError::Decode(format!("unsupported image format {format:?}")));
            }
        }

        let image = image::load_from_memory(bytes).map_err(|e| FoodError::Decode(e.to_string()))?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FoodError::Decode(format!("image has no pixels: {width}x{height}")));
        }

        let decoded = DecodedImage::new(image.into_rgb8());
        // 形状不一致时整体失败，不返回部分结果
        decoded.pixels()?;

        tracing::debug!("Decoded image: {}x{}, {} bytes", width, height, bytes.len());
        Ok(decoded)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::Tiff
                | ImageFormat::WebP
                | ImageFormat::Gif
        )
    }
}
