pub mod aggregator;


pub use aggregator::{AggregationReport, DocumentSource, KnowledgeAggregator, KnowledgeSnapshot};
