use crate::config::OnnxConfig;
use crate::image::{DecodedImage, Letterbox};
use crate::models::{ClassVocabulary, Detection, DetectionModel};
use crate::utils::error::FoodError;
use crate::Result;
use ndarray::{s, ArrayView2, ArrayViewD};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// NMS 之前最多保留的候选框
const MAX_NMS_CANDIDATES: usize = 30_000;

/// Ultralytics 导出的 YOLO 检测模型（ONNX）
pub struct YoloDetector {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
    vocabulary: ClassVocabulary,
    letterbox: Letterbox,
    iou_threshold: f32,
    max_detections: usize,
}

impl YoloDetector {
    pub fn load(model_path: &Path, onnx_config: &OnnxConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(FoodError::ModelMissing(model_path.to_path_buf()));
        }

        let name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_path.display().to_string());

        tracing::info!("Loading detection model '{}' from: {}", name, model_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_config.intra_threads)?
            .commit_from_file(model_path)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| FoodError::ModelLoad(format!("Model '{}' has no inputs", name)))?;

        // 动态发现输出名称
        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(FoodError::ModelLoad(format!("Model '{}' has no outputs", name)));
            }
        };
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Model '{}' output[{}]: '{}'", name, i, output.name);
        }

        let vocabulary = Self::load_vocabulary(model_path, &session)?;
        tracing::info!(
            "Model '{}' ready: input='{}', output='{}', classes={}",
            name,
            input_name,
            output_name,
            vocabulary.len()
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
            vocabulary,
            letterbox: Letterbox::new(onnx_config.input_size),
            iou_threshold: onnx_config.iou_threshold,
            max_detections: onnx_config.max_detections,
        })
    }

    /// 类别表优先读取同名 `.names` 文件，否则读取模型元数据里的 `names`
    fn load_vocabulary(model_path: &Path, session: &Session) -> Result<ClassVocabulary> {
        let names_path = model_path.with_extension("names");
        if names_path.exists() {
            tracing::info!("Loading class names from: {}", names_path.display());
            return ClassVocabulary::from_file(&names_path);
        }

        let metadata = session.metadata()?;
        match metadata.custom("names")? {
            Some(raw) => ClassVocabulary::from_ultralytics_metadata(&raw),
            None => Err(FoodError::ModelLoad(format!(
                "No class names for {}: expected {} or 'names' model metadata",
                model_path.display(),
                names_path.display()
            ))),
        }
    }

    fn run(&self, image: &DecodedImage, threshold: f32) -> Result<Vec<Detection>> {
        let input_tensor = Tensor::from_array(self.letterbox.to_tensor(image)?)?;

        // 会话不可重入，按模型串行推理；立即提取数据避免生命周期冲突
        let prediction = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(&self.output_name) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(FoodError::Inference {
                        model: self.name.clone(),
                        message: format!(
                            "Output '{}' not found. Available outputs: {:?}",
                            self.output_name, available
                        ),
                    });
                }
            }
        };

        decode_predictions(
            prediction.view(),
            self.vocabulary.len(),
            threshold,
            self.iou_threshold,
            self.max_detections,
        )
    }
}

impl DetectionModel for YoloDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn vocabulary(&self) -> &ClassVocabulary {
        &self.vocabulary
    }

    fn infer(&self, image: &DecodedImage, threshold: f32) -> Result<Vec<Detection>> {
        let detections = self
            .run(image, threshold)
            .map_err(|e| e.into_inference_failure(&self.name))?;

        tracing::debug!(
            "Model '{}' kept {} detections at threshold {}",
            self.name,
            detections.len(),
            threshold
        );
        Ok(detections)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    bbox: [f32; 4], // x1, y1, x2, y2
    class_id: usize,
    score: f32,
}

/// 解析 `[1, 4 + nc, anchors]`（或转置后的 `[1, anchors, 4 + nc]`）输出，
/// 按阈值过滤并做按类别的 NMS。返回顺序为置信度降序。
pub(crate) fn decode_predictions(
    prediction: ArrayViewD<f32>,
    num_classes: usize,
    threshold: f32,
    iou_threshold: f32,
    max_detections: usize,
) -> Result<Vec<Detection>> {
    let shape = prediction.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 {
        return Err(FoodError::Internal(format!(
            "Unsupported detection output shape: {:?}, expected [1, features, anchors]",
            shape
        )));
    }

    let features = 4 + num_classes;
    let batch: ArrayView2<f32> = prediction.slice(s![0, .., ..]);

    // 统一成 [anchors, features]
    let rows: ArrayView2<f32> = if shape[1] == features {
        batch.reversed_axes()
    } else if shape[2] == features {
        batch
    } else {
        return Err(FoodError::Internal(format!(
            "Output shape {:?} does not match {} classes",
            shape, num_classes
        )));
    };

    let mut candidates = Vec::new();
    for row in rows.outer_iter() {
        let (class_id, score) = row
            .iter()
            .skip(4)
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |(best_idx, best), (idx, &score)| {
                if score > best {
                    (idx, score)
                } else {
                    (best_idx, best)
                }
            });

        if !score.is_finite() || score < threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            continue;
        }

        candidates.push(Candidate {
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            class_id,
            score,
        });
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(MAX_NMS_CANDIDATES);

    Ok(non_max_suppression(candidates, iou_threshold, max_detections)
        .into_iter()
        .map(|c| Detection::new(c.class_id, c.score))
        .collect())
}

/// 按类别的非极大值抑制，输入需已按置信度降序排列
fn non_max_suppression(candidates: Vec<Candidate>, iou_threshold: f32, max_detections: usize) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len().min(max_detections));

    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }

        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - inter;

    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}
