pub mod extractor;
pub mod pipeline;
pub mod router;
pub mod types;

pub use extractor::ResultExtractor;
pub use pipeline::{AnalyzeOutcome, AnalyzePipeline};
pub use router::InferenceRouter;
pub use types::{AnalyzeRequest, AnalyzeResult, ModelRole, RoutedDetections};
