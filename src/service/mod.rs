pub mod aggregator;
pub mod classifier;
pub mod evaluator;
pub mod fetcher;
pub mod http;
pub mod pipeline;
pub mod weights;

pub use classifier::classify;
pub use fetcher::{FetchOptions, HttpPageFetcher, PageFetcher};
pub use pipeline::{AnalysisPipeline, PipelineConfig, ProgressChannel};
pub use weights::WeightProfile;
