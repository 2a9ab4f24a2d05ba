pub mod build_record;
pub mod build_state;
pub mod chunk_kind;
pub mod dependency;
pub mod entry_point;
pub mod importer_record;
pub mod module_id;
pub mod module_table;
pub mod output_asset;
pub mod raw_idx;
pub mod resolved_id;
pub mod source_joiner;
