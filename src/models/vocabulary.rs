use crate::utils::error::FoodError;
use crate::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 模型自身的类别表：类别 id -> 类别名称，加载后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassVocabulary {
    names: Vec<String>,
}

impl ClassVocabulary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// 从类别文件加载（每行一个类别，行号即类别 id）
    ///
    /// 末尾的空行会被忽略；中间出现空行会导致后续 id 错位，直接拒绝。
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FoodError::ModelLoad(format!("Failed to read class names {}: {}", path.display(), e))
        })?;

        let mut names: Vec<String> = content.lines().map(|line| line.trim().to_string()).collect();
        while names.last().is_some_and(|line| line.is_empty()) {
            names.pop();
        }

        if names.is_empty() {
            return Err(FoodError::ModelLoad(format!(
                "Class names file is empty: {}",
                path.display()
            )));
        }

        if let Some(line) = names.iter().position(|name| name.is_empty()) {
            return Err(FoodError::ModelLoad(format!(
                "Class names file {} has a blank line at class id {}",
                path.display(),
                line
            )));
        }

        Ok(Self { names })
    }

    /// 解析 Ultralytics 导出时写入 ONNX 元数据的 `names` 字段，
    /// 形如 `{0: 'person', 1: "kebab"}`（YAML 流式映射）
    pub fn from_ultralytics_metadata(raw: &str) -> Result<Self> {
        let entries: BTreeMap<usize, String> = serde_yaml::from_str(raw)
            .map_err(|e| FoodError::ModelLoad(format!("Malformed names metadata: {}", e)))?;

        if entries.is_empty() {
            return Err(FoodError::ModelLoad("Names metadata has no classes".to_string()));
        }

        for (expected, id) in entries.keys().enumerate() {
            if *id != expected {
                return Err(FoodError::ModelLoad(format!(
                    "Names metadata class ids are not contiguous: expected {expected}, found {id}"
                )));
            }
        }

        Ok(Self {
            names: entries.into_values().collect(),
        })
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
