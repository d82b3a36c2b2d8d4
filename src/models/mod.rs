pub mod detection;
pub mod registry;
pub mod vocabulary;
pub mod yolo;

pub use detection::{Detection, DetectionModel};
pub use registry::{ModelRegistry, ModelStats, RegistryStats};
pub use vocabulary::ClassVocabulary;
pub use yolo::YoloDetector;
