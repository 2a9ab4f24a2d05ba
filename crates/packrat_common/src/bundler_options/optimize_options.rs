/// Optimization toggles consumed by the chunk-graph partitioner. Passes run
/// in a fixed order regardless of declaration order here: dedupe, module id
/// assignment, commons extraction, limit/min-size merging, aggressive
/// merging, chunk id assignment.
#[derive(Debug, Default, Clone)]
pub struct OptimizeOptions {
  /// Collapse modules with byte-identical transformed source to one physical
  /// copy.
  pub dedupe: Option<bool>,
  /// Occurrence-order numeric id assignment; on by default, it is the
  /// recommended ordering for reproducible, size-efficient output.
  pub occurrence_order: Option<bool>,
  pub commons_chunks: Vec<CommonsChunkOptions>,
  /// Greedily merge chunks until at most this many remain.
  pub max_chunks: Option<u32>,
  /// Greedily merge any chunk below this size into its cheapest partner.
  pub min_chunk_size: Option<usize>,
  pub aggressive_merging: Option<AggressiveMergingOptions>,
}

#[derive(Debug, Clone)]
pub struct CommonsChunkOptions {
  /// Name of the chunk receiving the shared modules. Colliding with an entry
  /// name is a configuration error.
  pub name: String,
  /// Chunks to extract from; `None` selects every entry chunk.
  pub chunks: Option<Vec<String>>,
  /// A module moves when it appears in at least this many selected chunks.
  pub min_count: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct AggressiveMergingOptions {
  /// Merge a pair when the predicted merged size undercuts the unmerged sum
  /// by at least this many bytes.
  pub min_size_reduction: usize,
  /// Hoist modules not common to the merged pair into the parent chunks
  /// instead of duplicating them.
  pub move_to_parents: bool,
}
