// Cluster namer trait — swap-ready abstraction.
//
// Deriving a human-readable name for a complaint cluster is the one step
// that benefits from smarter text generation. The contract is narrow and
// synchronous: keywords and sample texts in, (name, description) out. The
// default is a local heuristic; an external generation backend can be
// injected without touching the pipeline.

use anyhow::Result;

/// Trait for deriving a cluster's name and one-sentence description.
pub trait ClusterNamer: Send + Sync {
    fn name_cluster(&self, keywords: &[String], sample_texts: &[String]) -> Result<(String, String)>;
}
