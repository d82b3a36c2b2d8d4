#![allow(dead_code)]

use food_detect::image::DecodedImage;
use food_detect::models::{ClassVocabulary, Detection, DetectionModel, ModelRegistry};
use food_detect::{FoodError, Result};
use image::{DynamicImage, ImageFormat, RgbImage};
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 预设输出的检测模型，记录调用次数与收到的阈值
pub struct ScriptedModel {
    name: String,
    vocabulary: ClassVocabulary,
    raw: Vec<Detection>,
    fail: bool,
    calls: AtomicUsize,
    thresholds: Mutex<Vec<f32>>,
}

impl ScriptedModel {
    pub fn new(name: &str, labels: &[&str], raw: Vec<Detection>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            vocabulary: ClassVocabulary::new(labels.iter().copied()),
            raw,
            fail: false,
            calls: AtomicUsize::new(0),
            thresholds: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &str, labels: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            vocabulary: ClassVocabulary::new(labels.iter().copied()),
            raw: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
            thresholds: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn thresholds(&self) -> Vec<f32> {
        self.thresholds.lock().clone()
    }
}

impl DetectionModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn vocabulary(&self) -> &ClassVocabulary {
        &self.vocabulary
    }

    fn infer(&self, _image: &DecodedImage, threshold: f32) -> Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.thresholds.lock().push(threshold);

        if self.fail {
            return Err(FoodError::Internal("session crashed".to_string()));
        }

        Ok(self.raw.iter().copied().filter(|d| d.passes(threshold)).collect())
    }
}

/// 主模型：阿拉伯菜；回退模型：Food-101
pub struct Fixture {
    pub primary: Arc<ScriptedModel>,
    pub fallback: Arc<ScriptedModel>,
    pub registry: Arc<ModelRegistry>,
}

impl Fixture {
    pub fn new(primary: Arc<ScriptedModel>, fallback: Arc<ScriptedModel>) -> Self {
        let registry = Arc::new(ModelRegistry::new(primary.clone(), fallback.clone()));
        Self {
            primary,
            fallback,
            registry,
        }
    }

    /// 主模型在 0.6 检测到 "كبدة"，回退模型在 0.95 检测到 "beef"
    pub fn liver_and_beef() -> Self {
        Self::new(
            ScriptedModel::new("arabic-food3", &["فول", "كبدة"], vec![Detection::new(1, 0.6)]),
            ScriptedModel::new("food-101", &["apple_pie", "beef"], vec![Detection::new(1, 0.95)]),
        )
    }

    pub fn model_calls(&self) -> usize {
        self.primary.calls() + self.fallback.calls()
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
